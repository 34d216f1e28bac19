//! Terminal reports for matrices, residuals and panel profiles

use anyhow::Result;
use colored::Colorize;
use tft_calibration::{CalibrationSample, Matrix, PanelProfile, Point};

/// Print the seven matrix fields and the mapping they encode
pub fn print_matrix(matrix: &Matrix) {
    let f = matrix.fields();

    println!("{}", "=".repeat(60));
    println!("{}", "Calibration Matrix".cyan().bold());
    println!("{}", "=".repeat(60));

    for (name, value) in [
        ("An", f.an),
        ("Bn", f.bn),
        ("Cn", f.cn),
        ("Dn", f.dn),
        ("En", f.en),
        ("Fn", f.fn_),
        ("Divider", f.divider),
    ] {
        println!("  {:<8} {:>12}", name, value.to_string().white());
    }

    println!("\n  {}", matrix.to_string().dimmed());
    println!("{}", "=".repeat(60));
}

/// Print per-sample residuals, returning the worst Chebyshev error
pub fn print_residuals(matrix: &Matrix, samples: &[CalibrationSample]) -> u32 {
    println!("\n{}", "Sample Residuals:".white().bold());

    let mut worst = 0u32;
    for sample in samples {
        let mapped = matrix.transform(sample.raw);
        let error = Point::new(
            mapped.x.saturating_sub(sample.reference.x),
            mapped.y.saturating_sub(sample.reference.y),
        );
        let distance = mapped.chebyshev_distance(sample.reference);
        worst = worst.max(distance);

        let marker = match distance {
            0 => "[OK]".green(),
            1 => "[~1]".yellow(),
            _ => "[OFF]".red(),
        };

        println!(
            "  {} raw {} -> {} (expected {}, error {:+}/{:+})",
            marker, sample.raw, mapped, sample.reference, error.x, error.y
        );
    }

    println!("  Worst error: {} px", worst);
    worst
}

/// Print a panel profile with its nominal matrix
pub fn print_profile(profile: &PanelProfile) -> Result<()> {
    println!("{}", "=".repeat(60));
    println!("{}", format!("Panel Profile: {}", profile.name).cyan().bold());
    println!("{}", "=".repeat(60));

    println!("  ID: {}", profile.id);
    println!("  Description: {}", profile.description);
    println!("  Display: {}x{}", profile.width, profile.height);
    println!(
        "  Raw X range: {}..{}",
        profile.raw_x_min, profile.raw_x_max
    );
    println!(
        "  Raw Y range: {}..{}",
        profile.raw_y_min, profile.raw_y_max
    );
    println!("  Axes swapped: {}", if profile.swap_axes { "yes" } else { "no" });

    println!("\n{}", "Nominal Samples:".white().bold());
    for sample in profile.nominal_samples() {
        println!("  raw {} -> {}", sample.raw, sample.reference);
    }
    println!();

    let matrix = profile.nominal_matrix()?;
    print_matrix(&matrix);
    Ok(())
}
