//! Version command implementation.

use std::io::{self, Write};

use console::style;

/// Write the one-line version banner.
pub fn write_banner<W: Write>(out: &mut W) -> io::Result<()> {
    writeln!(
        out,
        "{} {} - estimator smoke test for IBM Quantum hardware",
        style("xprobe").cyan().bold(),
        style(format!("v{}", env!("CARGO_PKG_VERSION"))).yellow()
    )
}

/// Execute the version command.
pub fn execute() -> io::Result<()> {
    let mut stdout = io::stdout().lock();
    write_banner(&mut stdout)?;
    writeln!(stdout)?;
    writeln!(stdout, "Components:")?;
    writeln!(stdout, "  xprobe-ir           Circuit and observable representation")?;
    writeln!(stdout, "  xprobe-qasm3        OpenQASM 3.0 emitter")?;
    writeln!(stdout, "  xprobe-hal          Session, backend and estimator job contract")?;
    writeln!(
        stdout,
        "  xprobe-adapter-ibm  IBM Quantum Platform (Qiskit Runtime REST, estimator v2)"
    )?;
    writeln!(stdout, "  xprobe-adapter-sim  Local noiseless statevector estimator")?;
    writeln!(stdout, "  xprobe-cli          Command-line interface")?;
    writeln!(stdout)?;
    writeln!(
        stdout,
        "Repository: {}",
        style(env!("CARGO_PKG_REPOSITORY")).underlined()
    )?;
    writeln!(stdout, "License:    {}", style(env!("CARGO_PKG_LICENSE")).dim())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::ErrorKind::BrokenPipe.into())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_banner_names_version() {
        let mut out = Vec::new();
        write_banner(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("xprobe"));
        assert!(text.contains(env!("CARGO_PKG_VERSION")));
        assert!(text.ends_with('\n'));
    }

    #[test]
    fn test_banner_on_closed_stdout_is_an_error() {
        let err = write_banner(&mut ClosedPipe).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }
}
