//! pulselink-host: drive a PulseLink device over its console UART.
//!
//! ```text
//! pulselink-host --port /dev/ttyACM0 led
//! pulselink-host configure-http --url http://10.0.0.2/hook --method POST \
//!     --data-template '{"presses":$$}'
//! pulselink-host monitor
//! printf 'led\nset-url http://10.0.0.2/hook\ndump-http\n' | pulselink-host session
//! ```
//!
//! Opening the port resets the board (DTR/RTS pulse), so every invocation
//! starts from the firmware's boot defaults.  `session` keeps one connection
//! open for a whole script of commands.

#[cfg(not(target_os = "espidf"))]
mod cli {
    use std::io::{self, BufRead};
    use std::time::Duration;

    use anyhow::{Context, Result, anyhow, bail};
    use clap::{Parser, Subcommand};
    use log::{LevelFilter, info};
    use serde_json::Value;

    use pulselink::app::{Command, Frame, Response};
    use pulselink::host::{ClientConfig, DeviceClient, SessionLine, parse_session_line, serial};

    /// Remote control for a PulseLink device.
    #[derive(Parser, Debug)]
    #[command(name = "pulselink-host", version)]
    struct Cli {
        /// Serial port the device is attached to.
        #[arg(long, short, env = "PULSELINK_PORT")]
        port: Option<String>,
        #[arg(long, default_value_t = 115_200)]
        baud: u32,
        /// Per-read timeout in milliseconds.
        #[arg(long, default_value_t = 1_000)]
        timeout: u64,
        /// Lines to inspect for a reply before giving up.
        #[arg(long, default_value_t = 10)]
        attempts: u32,
        /// Raise log verbosity (repeatable).
        #[arg(short, long, action = clap::ArgAction::Count)]
        verbose: u8,
        #[command(subcommand)]
        cmd: Cmd,
    }

    #[derive(Subcommand, Debug)]
    enum Cmd {
        /// Toggle the LED.
        Led,
        /// Play one brightness pulse.
        Pulse,
        /// Report whether the station is associated.
        CheckWifi,
        ConnectWifi {
            #[arg(long)]
            ssid: String,
            #[arg(long, default_value = "")]
            password: String,
        },
        DisconnectWifi,
        GetIp,
        /// Set (or with no value, clear) the request URL.
        SetUrl { url: Option<String> },
        /// Set (or with no value, clear) the request method.
        SetMethod { method: Option<String> },
        /// Set the request body template; must contain `$$` exactly once.
        SetDataTemplate { data_template: String },
        /// Fire the configured request now.
        SendRequest,
        /// Show the stored request configuration.
        DumpHttp,
        /// Set URL, method and template, then send.
        ConfigureHttp {
            #[arg(long)]
            url: String,
            #[arg(long)]
            method: String,
            #[arg(long)]
            data_template: Option<String>,
        },
        /// WiFi flag followed by the station address.
        Status,
        /// Print every line the device writes until interrupted.
        Monitor,
        /// Send an arbitrary JSON command object.
        Raw { json: String },
        /// Read commands from stdin, one per line, over a single connection.
        Session,
    }

    type Client = DeviceClient<Box<dyn serialport::SerialPort>>;

    fn open(cli: &Cli) -> Result<Client> {
        let Some(path) = cli.port.as_deref() else {
            let found = serial::available();
            bail!(
                "no --port given (set PULSELINK_PORT); available: {}",
                if found.is_empty() { "none".to_owned() } else { found.join(", ") }
            );
        };
        let cfg = ClientConfig {
            attempts: cli.attempts,
            read_timeout: Duration::from_millis(cli.timeout),
            baud: cli.baud,
            ..ClientConfig::default()
        };
        let port = serial::open(path, cfg.baud, cfg.read_timeout)
            .with_context(|| format!("failed to open {path}"))?;
        DeviceClient::connect(port, cfg).with_context(|| format!("failed to reset device on {path}"))
    }

    fn print(resp: &Response) -> Result<()> {
        let text = serde_json::to_string_pretty(resp).map_err(|e| anyhow!("{e}"))?;
        println!("{text}");
        Ok(())
    }

    fn exchange(client: &mut Client, cmd: &Command) -> Result<Response> {
        let resp = client
            .send_command(cmd)
            .ok_or_else(|| anyhow!("no response from device"))?;
        print(&resp)?;
        Ok(resp)
    }

    fn monitor(client: &mut Client) -> Result<()> {
        info!("monitoring; Ctrl-C to stop");
        loop {
            let Some(line) = client.next_line().context("serial read failed")? else {
                continue;
            };
            match Frame::classify(&line) {
                Frame::Heartbeat => println!("[heartbeat]"),
                Frame::Response(resp) => {
                    let text = serde_json::to_string(&resp).map_err(|e| anyhow!("{e}"))?;
                    println!("[response] {text}");
                }
                Frame::Other(text) => println!("[log] {text}"),
            }
        }
    }

    fn session(client: &mut Client) -> Result<()> {
        if !client.is_ready() {
            info!("device not confirmed ready; first command may be lost");
        }
        for line in io::stdin().lock().lines() {
            let line = line.context("stdin read failed")?;
            let reply = match parse_session_line(&line) {
                Ok(SessionLine::Blank) => continue,
                Ok(SessionLine::Quit) => break,
                Ok(SessionLine::Command(cmd)) => client.send_command(&cmd),
                Ok(SessionLine::Raw(value)) => client.send_json(&value),
                Err(msg) => {
                    eprintln!("{msg}");
                    continue;
                }
            };
            match reply {
                Some(resp) => print(&resp)?,
                None => eprintln!("no response from device"),
            }
        }
        Ok(())
    }

    pub fn run() -> Result<()> {
        let cli = Cli::parse();
        let level = match cli.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        };
        env_logger::Builder::new()
            .filter_level(level)
            .parse_default_env()
            .init();

        let mut client = open(&cli)?;

        match cli.cmd {
            Cmd::Led => exchange(&mut client, &Command::Led)?,
            Cmd::Pulse => exchange(&mut client, &Command::Pulse)?,
            Cmd::CheckWifi => exchange(&mut client, &Command::CheckWifi)?,
            Cmd::ConnectWifi { ssid, password } => exchange(
                &mut client,
                &Command::ConnectWifi {
                    ssid: Some(ssid),
                    password: Some(password),
                },
            )?,
            Cmd::DisconnectWifi => exchange(&mut client, &Command::DisconnectWifi)?,
            Cmd::GetIp => exchange(&mut client, &Command::GetIp)?,
            Cmd::SetUrl { url } => exchange(&mut client, &Command::SetUrl { url })?,
            Cmd::SetMethod { method } => exchange(&mut client, &Command::SetMethod { method })?,
            Cmd::SetDataTemplate { data_template } => exchange(
                &mut client,
                &Command::SetDataTemplate {
                    data_template: Some(data_template),
                },
            )?,
            Cmd::SendRequest => exchange(&mut client, &Command::SendRequest)?,
            Cmd::DumpHttp => exchange(&mut client, &Command::DumpHttp)?,
            Cmd::ConfigureHttp {
                url,
                method,
                data_template,
            } => {
                exchange(&mut client, &Command::SetUrl { url: Some(url) })?;
                exchange(&mut client, &Command::SetMethod { method: Some(method) })?;
                if data_template.is_some() {
                    exchange(&mut client, &Command::SetDataTemplate { data_template })?;
                }
                exchange(&mut client, &Command::SendRequest)?
            }
            Cmd::Status => {
                exchange(&mut client, &Command::CheckWifi)?;
                exchange(&mut client, &Command::GetIp)?
            }
            Cmd::Monitor => return monitor(&mut client),
            Cmd::Session => return session(&mut client),
            Cmd::Raw { json } => {
                let value: Value =
                    serde_json::from_str(&json).map_err(|e| anyhow!("invalid JSON: {e}"))?;
                if !value.is_object() {
                    bail!("command must be a JSON object");
                }
                let resp = client
                    .send_json(&value)
                    .ok_or_else(|| anyhow!("no response from device"))?;
                print(&resp)?;
                resp
            }
        };
        Ok(())
    }
}

#[cfg(not(target_os = "espidf"))]
fn main() -> anyhow::Result<()> {
    cli::run()
}

#[cfg(target_os = "espidf")]
fn main() {}
