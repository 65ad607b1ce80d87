use janus_core::config::TraceConfig;
use janus_core::probe::{PathVerdict, ProbeReport, Severity};
use miette::{IntoDiagnostic, Result};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Run the probe command.
///
/// When `json` is true, outputs a single JSON object to stdout. Otherwise,
/// outputs human-readable formatted text to stdout.
pub fn run(cwd: &Path, extra: &[PathBuf], json: bool) -> Result<()> {
    let mut candidates: Vec<PathBuf> = TraceConfig::default()
        .probe_paths
        .iter()
        .map(|candidate| cwd.join(candidate))
        .collect();
    candidates.extend(extra.iter().map(|path| {
        if path.is_absolute() {
            path.clone()
        } else {
            cwd.join(path)
        }
    }));

    let report = ProbeReport::collect_with(cwd, &candidates);

    if json {
        print_json(&report)?;
    } else {
        print_human(&report)?;
    }

    Ok(())
}

fn print_json(report: &ProbeReport) -> Result<()> {
    let json = serde_json::to_string_pretty(report).into_diagnostic()?;
    println!("{json}");
    Ok(())
}

fn print_human(report: &ProbeReport) -> Result<()> {
    let mut out = io::stdout().lock();

    // Host
    w(&mut out, "\x1b[1m## Host\x1b[0m\n")?;
    w(&mut out, &format!("  OS:             {}\n", report.host.os))?;
    w(
        &mut out,
        &format!(
            "  Version:        {}\n",
            report.host.version.as_deref().unwrap_or("unknown")
        ),
    )?;
    w(&mut out, &format!("  Arch:           {}\n", report.host.arch))?;
    w(&mut out, "\n")?;

    // Working directory through each resolution call
    w(&mut out, "\x1b[1m## Working Directory\x1b[0m\n")?;
    w(&mut out, &format!("  raw:            {}\n", report.cwd.raw))?;
    w(
        &mut out,
        &format!("  resolved:       {}\n", report.cwd.resolved),
    )?;
    w(&mut out, &format!("  realpath:       {}\n", report.cwd.real))?;
    w(
        &mut out,
        &format!("  native:         {}\n", report.cwd.native_real),
    )?;
    w(
        &mut out,
        &format!(
            "  raw == resolved: {}\n",
            match_str(report.cwd.matches(&report.cwd.resolved))
        ),
    )?;
    w(
        &mut out,
        &format!(
            "  raw == realpath: {}\n",
            match_str(report.cwd.matches(&report.cwd.real))
        ),
    )?;
    w(
        &mut out,
        &format!(
            "  raw == native:   {}\n",
            match_str(report.cwd.matches(&report.cwd.native_real))
        ),
    )?;
    w(&mut out, "\n")?;

    // Per-path verdicts
    w(&mut out, "\x1b[1m## Path Checks\x1b[0m\n")?;
    for check in &report.checks {
        match &check.verdict {
            PathVerdict::Ok => {
                w(
                    &mut out,
                    &format!("  \x1b[32mOK\x1b[0m:       {}\n", check.path),
                )?;
            }
            PathVerdict::Mismatch {
                real,
                native_real,
                symlink,
            } => {
                w(
                    &mut out,
                    &format!("  \x1b[31mMISMATCH\x1b[0m: {}\n", check.path),
                )?;
                w(&mut out, &format!("    realpath:        {real}\n"))?;
                w(&mut out, &format!("    native realpath: {native_real}\n"))?;
                w(
                    &mut out,
                    &format!("    symlink:         {}\n", yes_no(*symlink)),
                )?;
            }
            PathVerdict::Error { message } => {
                w(
                    &mut out,
                    &format!("  \x1b[33mERROR\x1b[0m:    {}: {message}\n", check.path),
                )?;
            }
        }
    }
    w(&mut out, "\n")?;

    // Warnings
    if report.warnings.is_empty() {
        w(&mut out, "\x1b[1m## Warnings\x1b[0m\n")?;
        w(&mut out, "  \x1b[32mNo warnings\x1b[0m\n")?;
    } else {
        w(
            &mut out,
            &format!(
                "\x1b[1m## Warnings\x1b[0m ({} total)\n",
                report.warnings.len()
            ),
        )?;
        for warning in &report.warnings {
            let prefix = match warning.severity {
                Severity::Info => "\x1b[34minfo\x1b[0m",
                Severity::Warn => "\x1b[33mwarn\x1b[0m",
            };
            w(
                &mut out,
                &format!("  [{prefix}] {}: {}\n", warning.code, warning.message),
            )?;
        }
    }

    out.flush().into_diagnostic()?;
    Ok(())
}

fn w(out: &mut impl Write, s: &str) -> Result<()> {
    out.write_all(s.as_bytes()).into_diagnostic()
}

fn match_str(matched: Option<bool>) -> &'static str {
    match matched {
        Some(true) => "yes",
        Some(false) => "no",
        None => "n/a",
    }
}

fn yes_no(b: bool) -> &'static str {
    if b {
        "yes"
    } else {
        "no"
    }
}
