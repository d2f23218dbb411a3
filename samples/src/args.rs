/******************************************************************************
 * Copyright ContinuousC. Licensed under the "Elastic License 2.0".           *
 ******************************************************************************/

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use vsphere_utils::{Config, HttpsStrategy};

use crate::{Error, Result};

/// Sample programs for vCenter and ESXi servers.
/// Every sample logs in, does its work, prints the result to stdout and
/// logs out again.
#[derive(Parser, Debug)]
#[clap(author, version, about)]
pub struct Args {
    /// Name or address of the vCenter or ESXi server.
    #[clap(short = 'H', long)]
    pub hostname: Option<String>,
    /// Port of the server. Defaults to 443 (80 with --http).
    #[clap(short = 'P', long)]
    pub port: Option<u16>,
    /// Name of the user that logs in.
    #[clap(short = 'u', long)]
    pub username: Option<String>,
    /// Password of the user.
    #[clap(short = 'p', long)]
    pub password: Option<String>,
    /// Locale for the session.
    #[clap(long)]
    pub locale: Option<String>,
    /// Connection settings as json, in place of the connection flags.
    #[clap(long)]
    pub config: Option<PathBuf>,
    /// Connect to an ESXi host instead of a vCenter server.
    #[clap(long)]
    pub esxi: bool,
    /// Location of the CA certificate, used to verify the certificate of
    /// the server.
    #[clap(short = 'c', long)]
    pub cacert: Option<PathBuf>,
    /// Trust any certificate. Only use this against test servers.
    #[clap(long)]
    pub danger_disable_certificate_verification: bool,
    /// Accept certificates issued for another hostname.
    #[clap(long)]
    pub danger_disable_hostname_verification: bool,
    /// Use plain http.
    #[clap(long)]
    pub http: bool,
    /// Read timeout in seconds.
    #[clap(short = 't', long, default_value = "60")]
    pub timeout: u64,
    /// increase verbosity. Every additional v will increase the verbosity
    /// by one stage. Verbose messages are sent to stderr.
    #[clap(short = 'v', long, action = clap::ArgAction::Count)]
    pub verbosity: u8,
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the server's about info.
    About,
    /// Look up an object by type and name.
    Find { object_type: String, name: String },
    /// List all objects of a type, by name.
    List { object_type: String },
    /// Print properties of an object.
    Properties {
        object_type: String,
        name: String,
        #[clap(required = true)]
        paths: Vec<String>,
    },
    /// Power on a virtual machine and wait for the task.
    PowerOn { vm: String },
    /// Power off a virtual machine and wait for the task.
    PowerOff { vm: String },
    /// Print the api session of a vCenter client.
    Session,
}

impl Args {
    pub fn init_logger(&self) {
        if let Err(e) = simplelog::TermLogger::init(
            match self.verbosity {
                0 => simplelog::LevelFilter::Warn,
                1 => simplelog::LevelFilter::Info,
                2 => simplelog::LevelFilter::Debug,
                3.. => simplelog::LevelFilter::Trace,
            },
            simplelog::ConfigBuilder::new()
                .add_filter_ignore_str("serde_xml_rs")
                .add_filter_ignore_str("handlebars")
                .add_filter_ignore_str("want")
                .add_filter_ignore_str("mio")
                .add_filter_ignore_str("hyper")
                .build(),
            simplelog::TerminalMode::Stderr,
            simplelog::ColorChoice::Auto,
        ) {
            eprintln!("Error: failed to initialize logging: {}", e);
            process::exit(1);
        }
    }

    pub async fn connection_config(&self) -> Result<Config> {
        if let Some(path) = &self.config {
            let data = tokio::fs::read_to_string(path)
                .await
                .map_err(|e| Error::ReadConfig(path.clone(), e))?;
            return serde_json::from_str(&data)
                .map_err(|e| Error::ParseConfig(path.clone(), e));
        }

        let hostname =
            self.hostname.clone().ok_or(Error::MissingArgument("hostname"))?;
        Ok(Config {
            port: self.port,
            https_strategy: self.https_strategy(),
            read_timeout: self.timeout,
            ..Config::new(hostname)
        })
    }

    fn https_strategy(&self) -> HttpsStrategy {
        if self.http {
            HttpsStrategy::Http
        } else if self.danger_disable_certificate_verification {
            HttpsStrategy::IgnoreCertificate
        } else if self.danger_disable_hostname_verification {
            HttpsStrategy::IgnoreHostname(self.cacert.clone())
        } else if let Some(path) = &self.cacert {
            HttpsStrategy::Specific(path.clone())
        } else {
            HttpsStrategy::Strict
        }
    }

    pub fn credentials(&self) -> Result<(&str, &str)> {
        Ok((
            self.username
                .as_deref()
                .ok_or(Error::MissingArgument("username"))?,
            self.password
                .as_deref()
                .ok_or(Error::MissingArgument("password"))?,
        ))
    }
}
