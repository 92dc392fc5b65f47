use crate::engine::AttackStats;
use std::io::{self, Write};

/// Human-readable run summary, printed to stderr after an attack and by the
/// `report` subcommand. The record stream itself stays on the sink.
pub fn write_summary<W: Write>(out: &mut W, stats: &AttackStats) -> io::Result<()> {
    writeln!(out, "requests:      {}", stats.hits)?;
    writeln!(out, "rate achieved: {:.2}/s", stats.achieved_rate())?;
    writeln!(
        out,
        "success:       {:.2}% ({} failed)",
        stats.success_ratio() * 100.0,
        stats.failures
    )?;
    writeln!(
        out,
        "bytes in/out:  {} / {}",
        stats.bytes_in, stats.bytes_out
    )?;

    if stats.profiled() > 0 {
        writeln!(
            out,
            "render ms:     min {} / mean {:.1} / p50 {} / p90 {} / p95 {} / p99 {} / max {}",
            stats.render_min(),
            stats.render_mean(),
            stats.render_percentile(50.0),
            stats.render_percentile(90.0),
            stats.render_percentile(95.0),
            stats.render_percentile(99.0),
            stats.render_max(),
        )?;
    }
    if stats.missing_profiles > 0 {
        writeln!(
            out,
            "no profile:    {} hits without a usable {} header",
            stats.missing_profiles,
            crate::http::PROFILE_HEADER
        )?;
    }

    let mut codes: Vec<_> = stats.status_codes.iter().collect();
    codes.sort_by_key(|(code, _)| **code);
    for (code, count) in codes {
        writeln!(out, "status {code}:    {count}")?;
    }

    let mut errors: Vec<_> = stats.errors.iter().collect();
    errors.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
    for (error, count) in errors {
        writeln!(out, "error ({count}x):  {error}")?;
    }

    Ok(())
}
