//! Host client tests against a scripted serial port, plus one exchange
//! where the port is fed by a real `DeviceService`.

use std::io;
use std::time::Duration;

use serde_json::json;

use pulselink::app::{Command, DeviceService, Frame, Response};
use pulselink::config::DeviceConfig;
use pulselink::events::PressLatch;
use pulselink::host::{ClientConfig, DeviceClient, SessionLine, parse_session_line};
use pulselink::link::LineChannel;

use crate::mock_hw::{
    ControlLine, MockDelay, MockHttp, MockLed, MockSerial, MockTransport, MockWifi, RecordingSink,
};

const HEARTBEAT: &str = "{\"status\":\"heartbeat\"}\n";

fn fast() -> ClientConfig {
    ClientConfig {
        attempt_delay: Duration::ZERO,
        reset_settle: Duration::ZERO,
        ready_timeout: Duration::ZERO,
        ..ClientConfig::default()
    }
}

fn connected() -> DeviceClient<MockSerial> {
    DeviceClient::connect(MockSerial::default(), fast()).unwrap()
}

#[test]
fn connect_resets_then_drains_boot_noise() {
    let port = MockSerial::with_input("ESP-ROM:esp32c3-api1-20210207\nrst:0x1\n");
    let client = DeviceClient::connect(port, fast()).unwrap();
    let port = client.into_inner();

    assert_eq!(
        port.control,
        [
            ControlLine::Dtr(false),
            ControlLine::Rts(false),
            ControlLine::Dtr(true),
            ControlLine::Rts(true),
        ]
    );
    assert!(port.rx.is_empty());
    assert!(port.tx.is_empty());
}

#[test]
fn connect_waits_for_first_heartbeat_after_boot() {
    let mut port = MockSerial::with_input("ESP-ROM:esp32c3-api1-20210207\n");
    port.bursts.push_back(
        format!("I (312) pulselink: PulseLink v0.1.0\n{HEARTBEAT}{HEARTBEAT}").into_bytes(),
    );
    let cfg = ClientConfig {
        ready_timeout: Duration::from_secs(1),
        ..fast()
    };
    let mut client = DeviceClient::connect(port, cfg).unwrap();
    assert!(client.is_ready());
    assert!(client.link_mut().tx.is_empty(), "nothing written while booting");

    client.link_mut().queue("{\"val\": \"LED toggled\"}\n");
    assert_eq!(
        client.send_command(&Command::Led),
        Some(Response::val("LED toggled"))
    );
}

#[test]
fn read_failure_becomes_error_reply() {
    let mut client = connected();
    client.link_mut().fail_reads = Some(io::ErrorKind::BrokenPipe);
    assert_eq!(
        client.send_command(&Command::GetIp),
        Some(Response::Error("device unplugged".into()))
    );
    assert_eq!(client.link_mut().tx, b"{\"cmd\":\"get_ip\"}\r\n");
}

#[test]
fn command_is_one_crlf_terminated_json_line() {
    let mut client = connected();
    client.link_mut().queue("{\"val\": \"URL set\"}\n");
    let reply = client.send_command(&Command::SetUrl {
        url: Some("http://10.0.0.2/hook".into()),
    });
    assert_eq!(reply, Some(Response::val("URL set")));

    let sent = String::from_utf8(client.link_mut().tx.clone()).unwrap();
    assert!(sent.ends_with("\r\n"));
    assert_eq!(sent.matches('\n').count(), 1);
    let value: serde_json::Value = serde_json::from_str(sent.trim_end()).unwrap();
    assert_eq!(value, json!({"cmd": "set_url", "url": "http://10.0.0.2/hook"}));
}

#[test]
fn heartbeats_are_skipped_before_reply() {
    let mut client = connected();
    client
        .link_mut()
        .queue(&format!("{HEARTBEAT}{HEARTBEAT}{{\"val\": \"on\"}}\n"));
    assert_eq!(client.send_command(&Command::Led), Some(Response::val("on")));
}

#[test]
fn log_output_is_skipped_before_reply() {
    let mut client = connected();
    client.link_mut().queue(
        "I (5120) wifi:connected with lab, aid = 1\n\
         {\"val\": \"WiFi connected\"}\n",
    );
    assert_eq!(
        client.send_command(&Command::ConnectWifi {
            ssid: Some("lab".into()),
            password: None,
        }),
        Some(Response::val("WiFi connected"))
    );
}

#[test]
fn gives_up_after_ten_lines() {
    let mut client = connected();
    for _ in 0..15 {
        client.link_mut().queue(HEARTBEAT);
    }
    assert_eq!(client.send_command(&Command::CheckWifi), None);

    let left = client.link_mut().rx.iter().filter(|b| **b == b'\n').count();
    assert_eq!(left, 5, "exactly ten lines consumed");
}

#[test]
fn reply_on_eleventh_line_is_missed() {
    let mut client = connected();
    for _ in 0..10 {
        client.link_mut().queue(HEARTBEAT);
    }
    client.link_mut().queue("{\"val\": true}\n");
    assert_eq!(client.send_command(&Command::CheckWifi), None);
}

#[test]
fn error_reply_counts_as_no_result() {
    let mut client = connected();
    client
        .link_mut()
        .queue("{\"error\":\"URL or method not set\"}\n");
    assert_eq!(client.send_command(&Command::SendRequest), None);
}

#[test]
fn custom_attempt_budget_is_honoured() {
    let mut client = DeviceClient::connect(
        MockSerial::default(),
        ClientConfig {
            attempts: 3,
            ..fast()
        },
    )
    .unwrap();
    client
        .link_mut()
        .queue(&format!("{HEARTBEAT}{HEARTBEAT}{{\"val\": 1}}\n"));
    assert_eq!(client.send_command(&Command::Pulse), Some(Response::val(1)));
}

#[test]
fn raw_json_objects_pass_through() {
    let mut client = connected();
    client.link_mut().queue("{\"val\": \"Invalid command\"}\n");
    let reply = client.send_json(&json!({"cmd": "reboot"}));
    assert_eq!(reply, Some(Response::val("Invalid command")));
    assert_eq!(client.link_mut().tx, b"{\"cmd\":\"reboot\"}\r\n");
}

#[test]
fn frames_classify_device_output() {
    assert_eq!(Frame::classify(HEARTBEAT.trim_end()), Frame::Heartbeat);
    assert_eq!(
        Frame::classify("{\"val\": \"ok\"}"),
        Frame::Response(Response::val("ok"))
    );
    assert_eq!(
        Frame::classify("{\"error\": \"x\"}"),
        Frame::Response(Response::error("x"))
    );
    assert!(matches!(Frame::classify("I (42) boot: ready"), Frame::Other(_)));
}

#[test]
fn client_understands_device_output() {
    let mut device = DeviceService::new(
        MockLed::default(),
        MockDelay::default(),
        MockWifi::default(),
        MockHttp::default(),
        DeviceConfig::default(),
    );
    let mut link = LineChannel::new(MockTransport::default());
    let latch = PressLatch::new();
    let mut sink = RecordingSink::default();

    // One idle iteration, then the command arrives.
    device.poll_once(&mut link, &latch, &(), &mut sink);
    let cmd = serde_json::to_string(&Command::GetIp).unwrap();
    link.transport_mut().push_line(&cmd);
    device.poll_once(&mut link, &latch, &(), &mut sink);

    let output = String::from_utf8(link.transport_mut().tx.clone()).unwrap();
    assert_eq!(output.lines().count(), 3, "heartbeat, reply, heartbeat");

    let mut client = connected();
    client.link_mut().queue(&output);
    assert_eq!(
        client.send_command(&Command::GetIp),
        Some(Response::val("0.0.0.0"))
    );
    assert_eq!(client.link_mut().tx, format!("{cmd}\r\n").into_bytes());
}

#[test]
fn session_script_shares_one_connection() {
    let mut client = connected();
    client.link_mut().queue(
        "{\"val\": \"LED toggled\"}\n\
         {\"val\": \"URL set\"}\n\
         {\"val\": {\"url\": \"http://x\", \"method\": null, \"data_template\": null}}\n",
    );

    let script = "led\n\nset-url http://x\n{\"cmd\":\"dump_http\"}\nquit\nled\n";
    let mut replies = Vec::new();
    for line in script.lines() {
        let reply = match parse_session_line(line).unwrap() {
            SessionLine::Blank => continue,
            SessionLine::Quit => break,
            SessionLine::Command(cmd) => client.send_command(&cmd),
            SessionLine::Raw(value) => client.send_json(&value),
        };
        replies.push(reply);
    }

    assert_eq!(replies.len(), 3);
    assert_eq!(
        replies[2],
        Some(Response::val(
            json!({"url": "http://x", "method": null, "data_template": null})
        ))
    );
    let port = client.into_inner();
    assert_eq!(port.control.len(), 4, "one reset for the whole script");
    assert_eq!(
        String::from_utf8(port.tx).unwrap(),
        "{\"cmd\":\"led\"}\r\n{\"cmd\":\"set_url\",\"url\":\"http://x\"}\r\n{\"cmd\":\"dump_http\"}\r\n"
    );
}
