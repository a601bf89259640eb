use mixfit::{GaussianMixture, sample_clusters};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Driving the EM Loop by Hand ===\n");

    let (x, _) = sample_clusters(2, 2, 150, (-4.0, 4.0), 0.5, Some(11))?;
    println!("Dataset: {} samples, {} features\n", x.nrows(), x.ncols());

    let mut model = GaussianMixture::new(2, 2)?
        .domain(-4.0, 4.0)?
        .random_state(11);
    model.set_data(&x)?;

    // The caller owns the stopping rule: iterate until the
    // log-likelihood improvement falls below a threshold.
    let tolerance = 1e-7;
    let mut previous = f64::NEG_INFINITY;
    for _ in 0..100 {
        model.e_step()?;
        model.m_step()?;

        let ll = model.log_likelihood()?;
        let improvement = ll - previous;
        println!(
            "iteration {:>3}: log-likelihood {:>12.4} (improvement {:+.2e})",
            model.iteration(),
            ll,
            improvement
        );

        if improvement.abs() < tolerance {
            println!("\nStopping: improvement below {:.0e}", tolerance);
            break;
        }
        previous = ll;
    }

    println!("\nFinal mixture weights: {:?}", model.weights());
    for i in 0..model.n_components() {
        println!(
            "Component {} mean: ({:.3}, {:.3})",
            i,
            model.means()[[i, 0]],
            model.means()[[i, 1]]
        );
    }

    // Responsibilities are available after any E-step: each row is the
    // posterior distribution over components for one point.
    model.e_step()?;
    let resp = model.responsibilities().expect("data is bound");
    let row = resp.row(0);
    println!(
        "\nPosterior for first point: [{:.4}, {:.4}] (sums to {:.6})",
        row[0],
        row[1],
        row.sum()
    );

    Ok(())
}
