use mixfit::{GaussianMixture, MemorySink, sample_clusters};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    println!("=== Gaussian Mixture Fit Convergence ===\n");

    // Three random clusters inside the domain
    let (x, labels) = sample_clusters(3, 2, 200, (-6.0, 6.0), 0.6, Some(7))?;
    println!("Dataset: {} samples, {} features", x.nrows(), x.ncols());
    for c in 0..3 {
        let count = labels.iter().filter(|&&l| l == c as f64).count();
        println!("  Generating cluster {}: {} points", c, count);
    }

    // Record one snapshot per EM iteration; a renderer could turn each
    // frame into a scatter + covariance-ellipse image and assemble them
    // into an animation.
    let mut model = GaussianMixture::new(3, 2)?
        .domain(-6.0, 6.0)?
        .random_state(7)
        .max_iter(60)
        .tolerance(1e-6);
    let mut sink = MemorySink::new();
    model.fit_with(&x, &mut sink)?;

    println!("\n=== Convergence Trace ===");
    println!("{:>9}  {:>14}", "iteration", "log-likelihood");
    for frame in &sink.frames {
        println!("{:>9}  {:>14.4}", frame.iteration, frame.log_likelihood);
    }
    println!(
        "\nConverged: {} after {} iterations",
        model.converged(),
        model.iteration()
    );

    println!("\n=== Recovered Parameters ===");
    for i in 0..model.n_components() {
        let cov = &model.covariances()[i];
        println!(
            "Component {}: weight {:.3}, mean ({:.2}, {:.2})",
            i,
            model.weights()[i],
            model.means()[[i, 0]],
            model.means()[[i, 1]]
        );
        println!(
            "  covariance [[{:.3}, {:.3}], [{:.3}, {:.3}]]",
            cov[[0, 0]],
            cov[[0, 1]],
            cov[[1, 0]],
            cov[[1, 1]]
        );
    }

    let predicted = model.predict(&x)?;
    println!("\n=== Cluster Sizes (predicted) ===");
    for i in 0..model.n_components() {
        let count = predicted.iter().filter(|&&l| l == i as f64).count();
        println!("  Component {}: {} points", i, count);
    }

    println!("\nAverage log-likelihood per point: {:.4}", model.score(&x)?);

    Ok(())
}
