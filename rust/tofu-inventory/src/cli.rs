use clap::Parser;
use std::ffi::OsString;

const USAGE_ARGS: &str = "tofu-inventory --list | --host <hostname>";
pub const USAGE: &str = "Usage: tofu-inventory --list | --host <hostname>";

/// Clap definition of the Ansible dynamic inventory protocol. Ansible calls the script with
/// `--list` once per run, and would call `--host <name>` per host if `_meta` were missing.
#[derive(Parser, Debug, Default)]
#[command(
    version,
    about,
    override_usage = USAGE_ARGS,
    long_about = "Ansible dynamic inventory for the homelab k3s cluster, read from OpenTofu outputs"
)]
pub struct Cli {
    #[arg(long, help = "print the full inventory, including _meta.hostvars")]
    pub list: bool,

    #[arg(
        long,
        value_name = "HOSTNAME",
        num_args = 0..=1,
        allow_hyphen_values = true,
        help = "print variables for a single host (always empty, see --list)"
    )]
    pub host: Option<Option<String>>,
}

/// What the invocation asked for. `--list` takes precedence over `--host`.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Mode {
    List,
    Host,
    Usage,
}

// Flags that are forwarded to clap. Everything else on the command line, including the
// `--host` value, is dropped.
const KNOWN_FLAGS: [&str; 6] = ["--list", "--host", "--help", "-h", "--version", "-V"];

/// Reduce a raw command line to the flags the protocol recognises. A recognised flag anywhere
/// on the line selects its mode, whatever else surrounds it. Each flag is kept at most once.
pub fn protocol_args<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut args = args.into_iter().map(Into::into);
    let mut ret: Vec<OsString> = args.next().into_iter().collect();
    for arg in args {
        let flag = match arg.to_str() {
            Some(s) if s.starts_with("--host=") => "--host",
            Some(s) => match KNOWN_FLAGS.iter().find(|f| **f == s) {
                Some(f) => *f,
                None => continue,
            },
            None => continue,
        };
        if !ret.iter().skip(1).any(|a| a == flag) {
            ret.push(flag.into());
        }
    }
    ret
}

impl Cli {
    /// Parse after [`protocol_args`] filtering. The only errors left are `--help`/`--version`
    /// displays.
    pub fn parse_protocol<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        Self::try_parse_from(protocol_args(args))
    }

    pub fn mode(&self) -> Mode {
        if self.list {
            Mode::List
        } else if self.host.is_some() {
            Mode::Host
        } else {
            Mode::Usage
        }
    }
}
