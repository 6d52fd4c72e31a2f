use async_trait::async_trait;
use chassis_monitor::adapters::SshConnector;
use chassis_monitor::app::runner::CONNECTION_FAILED;
use chassis_monitor::domain::model::{MetricValue, Mode, SinkPayload, SinkResponse};
use chassis_monitor::domain::ports::{CommandSource, Connector, MetricSink};
use chassis_monitor::{run, Monitor, MonitorConfig, MonitorError, Result};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

const HEADER: &str = "<module>      <presence>  <pwrState>  <health>    <svcTag>";

#[derive(Clone)]
struct MockChassis {
    outputs: HashMap<String, std::result::Result<String, String>>,
    executed: Arc<Mutex<Vec<String>>>,
    released: Arc<AtomicBool>,
    closed: Arc<AtomicBool>,
}

impl MockChassis {
    fn new(modinfo: &str, errors: &str) -> Self {
        let mut outputs = HashMap::new();
        outputs.insert("getmodinfo".to_string(), Ok(modinfo.to_string()));
        outputs.insert("getactiveerrors".to_string(), Ok(errors.to_string()));
        Self {
            outputs,
            executed: Arc::new(Mutex::new(Vec::new())),
            released: Arc::new(AtomicBool::new(false)),
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    fn failing(mut self, command: &str, stderr: &str) -> Self {
        self.outputs
            .insert(command.to_string(), Err(stderr.to_string()));
        self
    }
}

struct MockSession {
    chassis: MockChassis,
}

#[async_trait]
impl CommandSource for MockSession {
    async fn execute(&self, command: &str) -> Result<String> {
        self.chassis
            .executed
            .lock()
            .unwrap()
            .push(command.to_string());
        match self.chassis.outputs.get(command) {
            Some(Ok(text)) => Ok(text.clone()),
            Some(Err(stderr)) => Err(MonitorError::CommandExecutionError {
                command: command.to_string(),
                message: stderr.clone(),
            }),
            None => Err(MonitorError::CommandExecutionError {
                command: command.to_string(),
                message: "Unknown command".to_string(),
            }),
        }
    }
}

impl Drop for MockSession {
    fn drop(&mut self) {
        self.chassis.released.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl Connector for MockChassis {
    type Session = MockSession;

    async fn connect(&self) -> Result<MockSession> {
        Ok(MockSession {
            chassis: self.clone(),
        })
    }

    async fn release(&self, session: MockSession) {
        self.closed.store(true, Ordering::SeqCst);
        drop(session);
    }
}

struct UnreachableChassis;

#[async_trait]
impl Connector for UnreachableChassis {
    type Session = MockSession;

    async fn connect(&self) -> Result<MockSession> {
        Err(MonitorError::ConnectionError {
            host: "10.0.0.9".to_string(),
            message: "Connection refused".to_string(),
        })
    }
}

#[derive(Default)]
struct CaptureSink {
    sent: Mutex<Vec<SinkPayload>>,
    calls: AtomicUsize,
}

#[async_trait]
impl MetricSink for CaptureSink {
    async fn send(&self, payload: &SinkPayload) -> Result<SinkResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.sent.lock().unwrap().push(payload.clone());
        Ok(SinkResponse {
            processed: payload.item_count(),
            failed: 0,
            info: String::new(),
        })
    }
}

impl CaptureSink {
    fn only_payload(&self) -> SinkPayload {
        let sent = self.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        sent[0].clone()
    }
}

fn monitor() -> Monitor<MonitorConfig> {
    Monitor::new(MonitorConfig::for_host("m1000e"))
}

fn item<'a>(payload: &'a SinkPayload, key: &str) -> &'a MetricValue {
    &payload.hosts["m1000e"][key]
}

#[tokio::test]
async fn test_check_single_module_with_critical_error() {
    let modinfo = format!(
        "{}\nPS1           Present     ON          OK          TAG123\n",
        HEADER
    );
    let errors = "Module ID = PS1\nSeverity = Critical\nMessage = Fan failure\n\n";
    let chassis = MockChassis::new(&modinfo, errors);
    let sink = CaptureSink::default();

    let report = run(&monitor(), Mode::Check, &chassis, &sink).await;

    assert!(report.is_clean());
    assert!(report.discovery.is_none());
    let payload = sink.only_payload();
    assert_eq!(item(&payload, "presence[PS1]"), &MetricValue::Ordinal(1));
    assert_eq!(item(&payload, "power[PS1]"), &MetricValue::Ordinal(3));
    assert_eq!(item(&payload, "health[PS1]"), &MetricValue::Ordinal(4));
    assert_eq!(item(&payload, "critical[PS1]").as_text(), Some("Fan failure"));
    assert_eq!(item(&payload, "noncritical[PS1]").as_text(), Some(""));
    assert_eq!(item(&payload, "dell_script_errors").as_text(), Some(""));
    assert_eq!(payload.item_count(), 6);

    assert_eq!(
        *chassis.executed.lock().unwrap(),
        vec!["getmodinfo".to_string(), "getactiveerrors".to_string()]
    );
    assert!(chassis.closed.load(Ordering::SeqCst));
    assert!(chassis.released.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_check_absent_module_and_unknown_power_state() {
    let modinfo = format!(
        "{}\nSwitch-2      Absent      BOOTING     N/A         N/A\n",
        HEADER
    );
    let chassis = MockChassis::new(&modinfo, "");
    let sink = CaptureSink::default();

    run(&monitor(), Mode::Check, &chassis, &sink).await;

    let payload = sink.only_payload();
    assert_eq!(item(&payload, "presence[Switch-2]").as_ordinal(), Some(0));
    assert_eq!(item(&payload, "power[Switch-2]").as_ordinal(), Some(0));
    assert_eq!(item(&payload, "health[Switch-2]").as_ordinal(), Some(0));
}

#[tokio::test]
async fn test_error_log_failure_does_not_block_module_items() {
    let modinfo = format!(
        "{}\nServer-1      Present     ON          Warning     7XK2Q52\n",
        HEADER
    );
    let chassis = MockChassis::new(&modinfo, "").failing("getactiveerrors", "ERROR: Timed out");
    let sink = CaptureSink::default();

    let report = run(&monitor(), Mode::Check, &chassis, &sink).await;

    assert!(!report.is_clean());
    let payload = sink.only_payload();
    assert_eq!(item(&payload, "health[Server-1]").as_ordinal(), Some(3));
    assert_eq!(item(&payload, "critical[Server-1]").as_text(), Some(""));
    let errors = item(&payload, "dell_script_errors").as_text().unwrap();
    assert!(errors.contains("Timed out"));
}

#[tokio::test]
async fn test_module_table_failure_still_sends_diagnostics() {
    let chassis = MockChassis::new("", "").failing("getmodinfo", "ERROR: Invalid command");
    let sink = CaptureSink::default();

    let report = run(&monitor(), Mode::Check, &chassis, &sink).await;

    assert!(report.delivery.is_ok());
    let payload = sink.only_payload();
    assert_eq!(payload.item_count(), 1);
    let errors = item(&payload, "dell_script_errors").as_text().unwrap();
    assert!(errors.contains("Invalid command"));
    // the error log is not requested when there are no modules to attach it to
    assert_eq!(*chassis.executed.lock().unwrap(), vec!["getmodinfo".to_string()]);
}

#[tokio::test]
async fn test_missing_header_marker_is_reported() {
    let modinfo = "<module>  <presence>  <pwrState>  <svcTag>\nPS1  Present  ON  T\n";
    let chassis = MockChassis::new(modinfo, "");
    let sink = CaptureSink::default();

    run(&monitor(), Mode::Check, &chassis, &sink).await;

    let payload = sink.only_payload();
    assert_eq!(payload.item_count(), 1);
    let errors = item(&payload, "dell_script_errors").as_text().unwrap();
    assert!(errors.contains("<health>"));
}

#[tokio::test]
async fn test_connection_failure_still_sends_payload() {
    let sink = CaptureSink::default();

    let report = run(&monitor(), Mode::Check, &UnreachableChassis, &sink).await;

    assert_eq!(sink.calls.load(Ordering::SeqCst), 1);
    assert_eq!(report.diagnostics.messages().len(), 1);
    let payload = sink.only_payload();
    let errors = item(&payload, "dell_script_errors").as_text().unwrap();
    assert!(errors.contains("Connection refused"));
}

#[tokio::test]
async fn test_missing_chassis_settings_still_send_payload() {
    // --zhost given, --host and --user not
    let config = MonitorConfig::for_host("m1000e");
    let connector = SshConnector::new(&config);
    let sink = CaptureSink::default();

    let report = run(&Monitor::new(config), Mode::Check, &connector, &sink).await;

    assert!(report.delivery.is_ok());
    let payload = sink.only_payload();
    assert_eq!(payload.item_count(), 1);
    let errors = item(&payload, "dell_script_errors").as_text().unwrap();
    assert!(errors.starts_with(CONNECTION_FAILED));
    assert!(errors.contains("chassis.host"));
}

#[tokio::test]
async fn test_malformed_error_group_between_good_groups() {
    let modinfo = format!(
        "{h}\nPS1           Present     ON          OK          T1\nFan-3         Present     ON          Warning     T2\nServer-2      Present     ON          OK          T3\n",
        h = HEADER
    );
    let errors = "\
Module ID = PS1
Severity = Critical
Message = Fan failure

Module ID = Fan-3
no separator on this line
Message = Speed below threshold

Module ID = SERVER-2
Severity = NonCritical
Message = Memory ECC corrected

";
    let chassis = MockChassis::new(&modinfo, errors);
    let sink = CaptureSink::default();

    let report = run(&monitor(), Mode::Check, &chassis, &sink).await;

    assert!(report.diagnostics.is_empty());
    let payload = sink.only_payload();
    assert_eq!(item(&payload, "critical[PS1]").as_text(), Some("Fan failure"));
    assert_eq!(item(&payload, "critical[Fan-3]").as_text(), Some(""));
    assert_eq!(item(&payload, "noncritical[Fan-3]").as_text(), Some(""));
    assert_eq!(
        item(&payload, "noncritical[Server-2]").as_text(),
        Some("Memory ECC corrected")
    );
}

#[tokio::test]
async fn test_discover_lists_every_row_in_order() {
    let modinfo = format!(
        "{h}\nChassis       Present     ON          OK          ABC1234\n\nPS-1          Present     Online      OK\nPS-2          Absent      N/A         N/A\n",
        h = HEADER
    );
    let chassis = MockChassis::new(&modinfo, "");
    let sink = CaptureSink::default();

    let report = run(&monitor(), Mode::Discover, &chassis, &sink).await;

    let document = report.discovery.expect("discovery document");
    let json = serde_json::to_value(&document).unwrap();
    assert_eq!(
        json,
        serde_json::json!({"data": [
            {"{#DELL.MODULE.NAME}": "Chassis"},
            {"{#DELL.MODULE.NAME}": "PS-1"},
            {"{#DELL.MODULE.NAME}": "PS-2"}
        ]})
    );

    // discovery never touches the error log
    assert_eq!(*chassis.executed.lock().unwrap(), vec!["getmodinfo".to_string()]);

    let payload = sink.only_payload();
    assert_eq!(payload.item_count(), 1);
    assert_eq!(item(&payload, "dell_script_errors").as_text(), Some(""));
}

#[tokio::test]
async fn test_discover_on_unreachable_chassis_yields_empty_document() {
    let sink = CaptureSink::default();

    let report = run(&monitor(), Mode::Discover, &UnreachableChassis, &sink).await;

    let document = report.discovery.unwrap();
    assert!(document.data.is_empty());
    assert!(!report.diagnostics.is_empty());
}

#[tokio::test]
async fn test_custom_commands_and_keys() {
    let mut config = MonitorConfig::for_host("m1000e");
    config.commands.module_table = "racadm getmodinfo".to_string();
    config.commands.error_log = "racadm getactiveerrors".to_string();
    config.sink.errors_key = "cmc_errors".to_string();

    let modinfo = format!("{}\nPS1           Present     ON          OK          T\n", HEADER);
    let mut chassis = MockChassis::new("", "");
    chassis.outputs.clear();
    chassis
        .outputs
        .insert("racadm getmodinfo".to_string(), Ok(modinfo));
    chassis
        .outputs
        .insert("racadm getactiveerrors".to_string(), Ok(String::new()));
    let sink = CaptureSink::default();

    let report = run(&Monitor::new(config), Mode::Check, &chassis, &sink).await;

    tokio_test::assert_ok!(&report.delivery);
    let payload = sink.only_payload();
    assert_eq!(item(&payload, "cmc_errors").as_text(), Some(""));
    assert_eq!(item(&payload, "power[PS1]").as_ordinal(), Some(3));
}
