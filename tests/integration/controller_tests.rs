//! Control loop tests: one `poll_once` per simulated loop iteration, with
//! the host side played by bytes queued on a mock transport.

use std::rc::Rc;

use embedded_hal::delay::DelayNs;
use serde_json::{Value, json};

use pulselink::app::events::AppEvent;
use pulselink::app::{DeviceService, DeviceState};
use pulselink::config::DeviceConfig;
use pulselink::drivers::pulse::PulseProfile;
use pulselink::events::PressLatch;
use pulselink::link::LineChannel;

use crate::mock_hw::{
    MockDelay, MockHttp, MockLed, MockTransport, MockWifi, RecordingSink, SimClock,
};

type Service<D = MockDelay> = DeviceService<MockLed, D, MockWifi, MockHttp>;

fn quiet_config() -> DeviceConfig {
    DeviceConfig {
        heartbeat: false,
        pulse: PulseProfile {
            cycle_ms: 100,
            steps: 10,
        },
        ..DeviceConfig::default()
    }
}

fn service(config: DeviceConfig, clock: &SimClock) -> Service {
    DeviceService::new(
        MockLed::default(),
        MockDelay {
            clock: Some(clock.clone()),
            ..MockDelay::default()
        },
        MockWifi::default(),
        MockHttp {
            clock: Some(clock.clone()),
            ..MockHttp::default()
        },
        config,
    )
}

/// One device wired to mocks.  The clock doubles as the watchdog.
struct Rig {
    svc: Service,
    link: LineChannel<MockTransport>,
    latch: Rc<PressLatch>,
    clock: SimClock,
    sink: RecordingSink,
}

impl Rig {
    fn new(config: DeviceConfig) -> Self {
        let clock = SimClock::default();
        let mut rig = Self {
            svc: service(config, &clock),
            link: LineChannel::new(MockTransport::default()),
            latch: Rc::new(PressLatch::new()),
            clock,
            sink: RecordingSink::default(),
        };
        rig.svc.start(&mut rig.sink);
        rig
    }

    fn quiet() -> Self {
        Self::new(quiet_config())
    }

    fn poll(&mut self) -> Vec<String> {
        self.svc
            .poll_once(&mut self.link, &self.latch, &self.clock, &mut self.sink);
        self.link.transport_mut().take_lines()
    }

    /// Send one command line and return everything the device wrote back.
    fn exchange(&mut self, line: &str) -> Vec<String> {
        self.link.transport_mut().push_line(line);
        self.poll()
    }

    fn reply(&mut self, line: &str) -> Value {
        let out = self.exchange(line);
        assert_eq!(out.len(), 1, "expected exactly one reply, got {out:?}");
        serde_json::from_str(&out[0]).unwrap()
    }
}

#[test]
fn led_toggles_off_on_off() {
    let mut rig = Rig::quiet();
    assert!(!rig.svc.state().led_on);

    assert_eq!(rig.exchange(r#"{"cmd":"led"}"#), [r#"{"val":"LED toggled"}"#]);
    assert_eq!(
        rig.svc.state(),
        DeviceState {
            led_on: true,
            duty: 1023
        }
    );
    assert_eq!(rig.svc.led().last(), Some(1023));

    assert_eq!(rig.exchange(r#"{"cmd":"led"}"#), [r#"{"val":"LED toggled"}"#]);
    assert_eq!(rig.svc.state(), DeviceState::default());
    assert_eq!(rig.svc.led().last(), Some(0));
}

#[test]
fn dump_http_reports_template_verbatim() {
    let mut rig = Rig::quiet();
    assert_eq!(
        rig.reply(r#"{"cmd":"dump_http"}"#),
        json!({"val": {"url": null, "method": null, "data_template": null}})
    );

    assert_eq!(
        rig.reply(r#"{"cmd":"set_url","url":"http://10.0.0.2/hook"}"#),
        json!({"val": "URL set"})
    );
    assert_eq!(
        rig.reply(r#"{"cmd":"set_method","method":"POST"}"#),
        json!({"val": "Method set"})
    );
    assert_eq!(
        rig.reply(r#"{"cmd":"set_data_template","data_template":"{\"n\":$$}"}"#),
        json!({"val": "Data template set"})
    );

    assert_eq!(
        rig.reply(r#"{"cmd":"dump_http"}"#),
        json!({"val": {
            "url": "http://10.0.0.2/hook",
            "method": "POST",
            "data_template": "{\"n\":$$}",
        }})
    );
}

#[test]
fn template_without_marker_is_rejected_and_previous_kept() {
    let mut rig = Rig::quiet();
    rig.reply(r#"{"cmd":"set_data_template","data_template":"{\"v\":$$}"}"#);

    assert_eq!(
        rig.reply(r#"{"cmd":"set_data_template","data_template":"{\"v\":1}"}"#),
        json!({"error": "Data template must contain $$"})
    );
    assert_eq!(rig.svc.template().data_template(), Some("{\"v\":$$}"));

    assert_eq!(
        rig.reply(r#"{"cmd":"set_data_template"}"#),
        json!({"error": "Data template is required"})
    );
}

#[test]
fn unknown_and_nameless_commands_are_invalid() {
    let mut rig = Rig::quiet();
    assert_eq!(
        rig.reply(r#"{"cmd":"self_destruct"}"#),
        json!({"val": "Invalid command"})
    );
    assert_eq!(rig.reply(r#"{"led":true}"#), json!({"val": "Invalid command"}));
    assert_eq!(rig.reply(r#"{"cmd":7}"#), json!({"val": "Invalid command"}));
}

#[test]
fn malformed_lines_get_no_reply_and_loop_continues() {
    let mut rig = Rig::quiet();
    assert!(rig.exchange("hello device").is_empty());
    assert!(rig.exchange("[1,2,3]").is_empty());
    assert!(rig.exchange(r#"{"cmd":"led""#).is_empty());

    let ignored = rig
        .sink
        .events
        .iter()
        .filter(|e| matches!(e, AppEvent::LineIgnored(_)))
        .count();
    assert_eq!(ignored, 3);

    assert_eq!(rig.reply(r#"{"cmd":"led"}"#), json!({"val": "LED toggled"}));
}

#[test]
fn wrongly_typed_field_gets_error_reply() {
    let mut rig = Rig::quiet();
    let reply = rig.reply(r#"{"cmd":"set_url","url":5}"#);
    assert!(reply.get("error").is_some(), "{reply}");
    assert_eq!(rig.svc.template().url(), None);
}

#[test]
fn heartbeat_every_iteration_while_running() {
    let mut rig = Rig::new(DeviceConfig {
        heartbeat: true,
        ..quiet_config()
    });
    for _ in 0..3 {
        assert_eq!(rig.poll(), [r#"{"status":"heartbeat"}"#]);
    }

    // A reply precedes the heartbeat of the same iteration.
    assert_eq!(
        rig.exchange(r#"{"cmd":"check_wifi"}"#),
        [r#"{"val":false}"#, r#"{"status":"heartbeat"}"#]
    );

    rig.svc.set_running(false);
    assert!(rig.poll().is_empty());
}

#[test]
fn one_line_per_iteration() {
    let mut rig = Rig::quiet();
    rig.link.transport_mut().push_line(r#"{"cmd":"led"}"#);
    rig.link.transport_mut().push_line(r#"{"cmd":"check_wifi"}"#);

    assert_eq!(rig.poll(), [r#"{"val":"LED toggled"}"#]);
    assert_eq!(rig.poll(), [r#"{"val":false}"#]);
    assert!(rig.poll().is_empty());
}

#[test]
fn command_split_across_reads_is_reassembled() {
    let mut rig = Rig::quiet();
    rig.link.transport_mut().rx.extend(br#"{"cmd":"ch"#);
    assert!(rig.poll().is_empty());
    rig.link.transport_mut().rx.extend(b"eck_wifi\"}\r\n");
    assert_eq!(rig.poll(), [r#"{"val":false}"#]);
}

#[test]
fn wifi_round_trip() {
    let mut rig = Rig::quiet();
    assert_eq!(rig.reply(r#"{"cmd":"get_ip"}"#), json!({"val": "0.0.0.0"}));
    assert_eq!(
        rig.reply(r#"{"cmd":"connect_wifi","ssid":"lab","password":"hunter22"}"#),
        json!({"val": "WiFi connected"})
    );
    assert_eq!(rig.reply(r#"{"cmd":"check_wifi"}"#), json!({"val": true}));
    assert_eq!(rig.reply(r#"{"cmd":"get_ip"}"#), json!({"val": "10.0.0.42"}));
    assert_eq!(
        rig.svc.wifi().joins,
        [("lab".to_owned(), "hunter22".to_owned())]
    );

    assert_eq!(
        rig.reply(r#"{"cmd":"disconnect_wifi"}"#),
        json!({"val": "WiFi disconnected"})
    );
    assert_eq!(rig.reply(r#"{"cmd":"get_ip"}"#), json!({"val": "0.0.0.0"}));
}

#[test]
fn refused_or_nameless_wifi_join_fails_softly() {
    let mut rig = Rig::quiet();
    assert_eq!(
        rig.reply(r#"{"cmd":"connect_wifi"}"#),
        json!({"val": "Failed to connect to WiFi"})
    );
    rig.svc.wifi_mut().refuse = Some("auth timeout".into());
    assert_eq!(
        rig.reply(r#"{"cmd":"connect_wifi","ssid":"lab"}"#),
        json!({"val": "Failed to connect to WiFi"})
    );
}

#[test]
fn send_request_needs_target() {
    let mut rig = Rig::quiet();
    assert_eq!(
        rig.reply(r#"{"cmd":"send_request"}"#),
        json!({"error": "URL or method not set"})
    );
    assert!(rig.svc.http().sent.is_empty());
}

#[test]
fn send_request_without_template_sends_nothing() {
    let mut rig = Rig::quiet();
    rig.svc.set_value_provider(Box::new(|| "1".to_owned()));
    rig.reply(r#"{"cmd":"set_url","url":"http://plug.local/toggle"}"#);
    rig.reply(r#"{"cmd":"set_method","method":"GET"}"#);

    assert_eq!(
        rig.reply(r#"{"cmd":"send_request"}"#),
        json!({"error": "Data template or get data function not set"})
    );
    assert!(rig.svc.http().sent.is_empty());
}

#[test]
fn send_request_returns_parsed_body() {
    let mut rig = Rig::quiet();
    rig.svc
        .http_mut()
        .replies
        .push_back(Ok(r#"{"state":"on","power":3.5}"#.to_owned()));
    rig.svc.set_value_provider(Box::new(|| "7".to_owned()));
    rig.reply(r#"{"cmd":"set_url","url":"http://plug.local/toggle"}"#);
    rig.reply(r#"{"cmd":"set_method","method":"POST"}"#);
    rig.reply(r#"{"cmd":"set_data_template","data_template":"{\"count\":$$}"}"#);

    assert_eq!(
        rig.reply(r#"{"cmd":"send_request"}"#),
        json!({"val": {"state": "on", "power": 3.5}})
    );
    let sent = &rig.svc.http().sent[0];
    assert_eq!(sent.method, "POST");
    assert_eq!(sent.url, "http://plug.local/toggle");
    assert_eq!(sent.body, r#"{"count":7}"#);
    assert_eq!(
        sent.headers,
        [("Content-Type".to_owned(), "application/json".to_owned())]
    );
}

#[test]
fn pulse_command_ramps_up_and_back_to_dark() {
    let mut rig = Rig::quiet();
    rig.reply(r#"{"cmd":"led"}"#);

    assert_eq!(rig.reply(r#"{"cmd":"pulse"}"#), json!({"val": "ok"}));
    assert_eq!(rig.svc.state(), DeviceState::default());
    assert_eq!(rig.svc.led().last(), Some(0));
    assert_eq!(rig.svc.pulse_count(), 1);
    // 10 frames each way, 10 ms per frame.
    assert_eq!(rig.svc.delay().total_ms(), 200);
}

#[test]
fn led_fault_mid_pulse_reports_step_and_leaves_output_dark() {
    let mut rig = Rig::quiet();
    rig.reply(r#"{"cmd":"led"}"#);
    assert!(rig.svc.state().led_on);

    rig.svc.led_mut().fail_nonzero = true;
    // Frame 0 is dark and goes through; frame 1 is the first lit one.
    assert_eq!(
        rig.reply(r#"{"cmd":"pulse"}"#),
        json!({"error": "PWM duty write failed at step 1: Other"})
    );
    assert_eq!(rig.svc.state(), DeviceState::default());
    assert_eq!(rig.svc.led().last(), Some(0));

    // The loop keeps serving commands afterwards.
    assert_eq!(rig.reply(r#"{"cmd":"check_wifi"}"#), json!({"val": false}));
}

#[test]
fn press_plays_pulse_then_fires_request() {
    let mut rig = Rig::quiet();
    let mut count = 0u32;
    rig.svc.set_value_provider(Box::new(move || {
        count += 1;
        count.to_string()
    }));
    rig.reply(r#"{"cmd":"set_url","url":"http://10.0.0.2/hook"}"#);
    rig.reply(r#"{"cmd":"set_method","method":"POST"}"#);
    rig.reply(r#"{"cmd":"set_data_template","data_template":"{\"presses\":$$}"}"#);

    rig.latch.raise();
    assert!(rig.poll().is_empty(), "press outcomes are not sent on the link");

    assert_eq!(rig.svc.pulse_count(), 1);
    assert_eq!(rig.svc.led().last(), Some(0));
    assert_eq!(rig.svc.http().sent.len(), 1);
    assert_eq!(rig.svc.http().sent[0].body, r#"{"presses":1}"#);

    let handled = rig.sink.events.iter().find_map(|e| match e {
        AppEvent::PressHandled {
            presses,
            pulse,
            request,
        } => Some((*presses, pulse.is_ok(), request.clone())),
        _ => None,
    });
    assert_eq!(handled, Some((1, true, Ok(json!({"ok": true})))));
}

#[test]
fn press_without_target_still_pulses_and_logs_error() {
    let mut rig = Rig::quiet();
    rig.latch.raise();
    rig.poll();

    assert_eq!(rig.svc.pulse_count(), 1);
    assert!(rig.svc.http().sent.is_empty());
    assert!(rig.sink.events.iter().any(|e| matches!(
        e,
        AppEvent::PressHandled {
            request: Err(_),
            ..
        }
    )));
}

/// Delay that simulates the button being pressed mid-animation.
struct PressingDelay {
    latch: &'static PressLatch,
}

impl DelayNs for PressingDelay {
    fn delay_ns(&mut self, _ns: u32) {
        self.latch.raise();
    }
}

#[test]
fn press_during_pulse_is_dropped_not_queued() {
    static LATCH: PressLatch = PressLatch::new();

    let mut svc: Service<PressingDelay> = DeviceService::new(
        MockLed::default(),
        PressingDelay { latch: &LATCH },
        MockWifi::default(),
        MockHttp::default(),
        quiet_config(),
    );
    let mut link = LineChannel::new(MockTransport::default());
    let mut sink = RecordingSink::default();

    link.transport_mut().push_line(r#"{"cmd":"pulse"}"#);
    svc.poll_once(&mut link, &LATCH, &(), &mut sink);

    assert_eq!(sink.dropped(), 1);
    assert!(!LATCH.is_pending());

    svc.poll_once(&mut link, &LATCH, &(), &mut sink);
    assert_eq!(sink.presses(), 0);
    assert_eq!(svc.pulse_count(), 1);
}

fn configure_hook(rig: &mut Rig) {
    rig.svc.set_value_provider(Box::new(|| "1".to_owned()));
    rig.reply(r#"{"cmd":"set_url","url":"http://10.0.0.2/hook"}"#);
    rig.reply(r#"{"cmd":"set_method","method":"POST"}"#);
    rig.reply(r#"{"cmd":"set_data_template","data_template":"{\"presses\":$$}"}"#);
}

#[test]
fn press_during_request_is_kept_for_next_iteration() {
    let mut rig = Rig::quiet();
    configure_hook(&mut rig);
    rig.svc.http_mut().press_during_request = Some(Rc::clone(&rig.latch));

    rig.latch.raise();
    rig.poll();
    assert_eq!(rig.sink.presses(), 1);
    assert_eq!(rig.sink.dropped(), 0);
    assert!(rig.latch.is_pending());

    rig.svc.http_mut().press_during_request = None;
    rig.poll();
    assert_eq!(rig.sink.presses(), 2);
    assert_eq!(rig.svc.pulse_count(), 2);
    assert_eq!(rig.svc.http().sent.len(), 2);
    assert!(!rig.latch.is_pending());
}

#[test]
fn watchdog_is_fed_between_pulse_and_slow_request() {
    let config = DeviceConfig {
        heartbeat: false,
        ..DeviceConfig::default()
    };
    let mut rig = Rig::new(config.clone());
    configure_hook(&mut rig);
    rig.svc.http_mut().latency_ms = u64::from(config.http_exchange_ceiling_ms());

    // Worst iteration: a press (pulse + request that times out in every
    // phase) followed by a `pulse` command on the same iteration.
    rig.latch.raise();
    rig.link.transport_mut().push_line(r#"{"cmd":"pulse"}"#);
    rig.poll();
    rig.svc.idle();
    rig.poll();

    assert_eq!(rig.svc.pulse_count(), 2);
    assert_eq!(rig.svc.http().sent.len(), 1);
    assert_eq!(rig.clock.now_ms(), 6_000 + 12_000 + 6_000 + 10);
    assert_eq!(rig.clock.longest_unfed_ms(), 12_000);
    assert!(rig.clock.longest_unfed_ms() <= u64::from(config.longest_unfed_ms()));
    assert!(rig.clock.longest_unfed_ms() < u64::from(config.watchdog_timeout_ms));
}
