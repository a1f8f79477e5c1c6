//! End-to-end pipeline tests against a scripted in-memory broker.
//!
//! The scripted broker replays a fixed sequence of steps (emit event, fail
//! connect, fail stream, end stream) so every resilience and ordering
//! guarantee can be exercised deterministically.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tokio::time::timeout;

use taskwire::{
    Action, Broker, BrokerError, Config, Connection, EventFilter, EventPump, Handlers,
    NormalizedEvent, RelayError, Runner, Sender,
};

#[derive(Debug)]
enum Step {
    Emit(serde_json::Value),
    FailConnect(&'static str),
    FailStream(&'static str),
    EndStream,
}

#[derive(Clone)]
struct ScriptedBroker {
    steps: Arc<Mutex<VecDeque<Step>>>,
}

impl ScriptedBroker {
    fn new(steps: Vec<Step>) -> Self {
        Self {
            steps: Arc::new(Mutex::new(steps.into())),
        }
    }
}

struct ScriptedConnection {
    steps: Arc<Mutex<VecDeque<Step>>>,
}

#[async_trait]
impl Broker for ScriptedBroker {
    type Conn = ScriptedConnection;

    async fn connect(&self) -> Result<Self::Conn, BrokerError> {
        let mut steps = self.steps.lock().unwrap();
        if matches!(steps.front(), Some(Step::FailConnect(_))) {
            let Some(Step::FailConnect(msg)) = steps.pop_front() else {
                unreachable!()
            };
            return Err(BrokerError::Connect {
                message: msg.to_string(),
            });
        }
        Ok(ScriptedConnection {
            steps: Arc::clone(&self.steps),
        })
    }
}

#[async_trait]
impl Connection for ScriptedConnection {
    async fn receive(&mut self, handlers: &mut Handlers<'_>) -> Result<(), BrokerError> {
        loop {
            let step = self.steps.lock().unwrap().pop_front();
            match step {
                Some(Step::Emit(value)) => {
                    handlers.dispatch(serde_json::from_value(value).unwrap());
                }
                Some(Step::FailStream(msg)) | Some(Step::FailConnect(msg)) => {
                    return Err(BrokerError::Stream {
                        message: msg.to_string(),
                    });
                }
                Some(Step::EndStream) => return Ok(()),
                // Script exhausted: behave like an idle broker.
                None => std::future::pending::<()>().await,
            }
        }
    }
}

fn test_config() -> Config {
    Config {
        throttle: Duration::from_millis(1),
        ..Config::default()
    }
}

async fn next(rx: &mut tokio::sync::broadcast::Receiver<NormalizedEvent>) -> NormalizedEvent {
    timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("timed out waiting for event")
        .expect("sender closed unexpectedly")
}

fn worker_online(hostname: &str, pid: u64, ts: f64) -> Step {
    Step::Emit(json!({
        "type": "worker-online", "hostname": hostname, "pid": pid, "timestamp": ts
    }))
}

fn task_event(ty: &str, uuid: &str, ts: f64) -> Step {
    Step::Emit(json!({
        "type": ty, "uuid": uuid, "hostname": "h1", "pid": 42, "timestamp": ts
    }))
}

#[tokio::test]
async fn pipeline_preserves_order_and_filters_heartbeats() {
    let cfg = test_config();
    let broker = ScriptedBroker::new(vec![
        worker_online("h1", 42, 100.0),
        task_event("task-received", "u1", 200.0),
        Step::Emit(json!({
            "type": "worker-heartbeat", "hostname": "h1", "pid": 42, "timestamp": 250.0
        })),
        task_event("task-started", "u1", 300.0),
        task_event("task-succeeded", "u1", 400.0),
    ]);

    let sender = Sender::new(cfg.bus_capacity_clamped());
    let mut rx = sender.subscribe();
    let pump = EventPump::spawn(broker, &cfg);
    let token = pump.cancellation();
    let runner = Runner::new(sender, EventFilter::NoHeartbeat, &cfg);
    let handle = tokio::spawn(async move { runner.run(pump).await });

    let first = next(&mut rx).await;
    assert_eq!(first.action, Action::BringWorkerOnline);
    let v = serde_json::to_value(&first).unwrap();
    assert_eq!(v["payload"]["id"], "h1.42");
    assert_eq!(v["payload"]["status"], "ONLINE");

    let actions: Vec<Action> = vec![
        first.action,
        next(&mut rx).await.action,
        next(&mut rx).await.action,
        next(&mut rx).await.action,
    ];
    assert_eq!(
        actions,
        [
            Action::BringWorkerOnline,
            Action::LoadTask,
            Action::UpdateTask,
            Action::CompleteTask,
        ]
    );

    token.cancel();
    assert!(handle.await.unwrap().is_ok());
}

#[tokio::test]
async fn ordering_follows_broker_timestamps() {
    let cfg = test_config();
    let broker = ScriptedBroker::new(vec![
        task_event("task-received", "u1", 1.0),
        task_event("task-started", "u1", 2.0),
        task_event("task-succeeded", "u1", 3.0),
    ]);

    let sender = Sender::new(cfg.bus_capacity_clamped());
    let mut rx = sender.subscribe();
    let pump = EventPump::spawn(broker, &cfg);
    let token = pump.cancellation();
    let runner = Runner::new(sender, EventFilter::NoFilter, &cfg);
    let handle = tokio::spawn(async move { runner.run(pump).await });

    let mut timestamps = Vec::new();
    for _ in 0..3 {
        timestamps.push(next(&mut rx).await.timestamp);
    }
    assert_eq!(timestamps, [1.0, 2.0, 3.0]);

    token.cancel();
    assert!(handle.await.unwrap().is_ok());
}

#[tokio::test]
async fn four_consecutive_connect_failures_are_fatal() {
    let cfg = test_config();
    let broker = ScriptedBroker::new(vec![
        Step::FailConnect("refused"),
        Step::FailConnect("refused"),
        Step::FailConnect("refused"),
        Step::FailConnect("refused"),
    ]);

    let sender = Sender::new(cfg.bus_capacity_clamped());
    let mut rx = sender.subscribe();
    let pump = EventPump::spawn(broker, &cfg);
    let runner = Runner::new(sender, EventFilter::NoFilter, &cfg);

    let res = timeout(Duration::from_secs(2), runner.run(pump))
        .await
        .expect("runner should stop on its own");
    match res {
        Err(RelayError::TooManyRetries { attempts, .. }) => assert_eq!(attempts, 4),
        other => panic!("expected TooManyRetries, got {other:?}"),
    }
    assert!(rx.try_recv().is_err(), "nothing may be published");
}

#[tokio::test]
async fn retry_budget_resets_after_successful_cycle() {
    let cfg = test_config();
    // Three failures (budget not yet spent), a successful cycle, then three
    // more failures: the reset keeps the pump alive through all of them.
    let broker = ScriptedBroker::new(vec![
        Step::FailConnect("refused"),
        Step::FailStream("reset"),
        Step::FailStream("reset"),
        worker_online("h1", 42, 100.0),
        Step::EndStream,
        Step::FailConnect("refused"),
        Step::FailStream("reset"),
        Step::FailStream("reset"),
        worker_online("h2", 7, 200.0),
    ]);

    let sender = Sender::new(cfg.bus_capacity_clamped());
    let mut rx = sender.subscribe();
    let pump = EventPump::spawn(broker, &cfg);
    let token = pump.cancellation();
    let runner = Runner::new(sender, EventFilter::NoFilter, &cfg);
    let handle = tokio::spawn(async move { runner.run(pump).await });

    let first = serde_json::to_value(next(&mut rx).await).unwrap();
    assert_eq!(first["payload"]["id"], "h1.42");
    let second = serde_json::to_value(next(&mut rx).await).unwrap();
    assert_eq!(second["payload"]["id"], "h2.7");

    token.cancel();
    assert!(handle.await.unwrap().is_ok());
}

#[tokio::test]
async fn unrecognized_event_stops_publishing() {
    let cfg = test_config();
    let broker = ScriptedBroker::new(vec![
        task_event("task-received", "u1", 100.0),
        task_event("task-unknownthing", "u2", 200.0),
        worker_online("h1", 42, 300.0),
    ]);

    let sender = Sender::new(cfg.bus_capacity_clamped());
    let mut rx = sender.subscribe();
    let pump = EventPump::spawn(broker, &cfg);
    let runner = Runner::new(sender, EventFilter::NoFilter, &cfg);

    let res = timeout(Duration::from_secs(2), runner.run(pump))
        .await
        .expect("runner should stop on its own");
    assert!(matches!(res, Err(RelayError::UnrecognizedEvent { .. })));

    // Only the event preceding the protocol break made it out.
    assert_eq!(rx.try_recv().unwrap().action, Action::LoadTask);
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn unmatched_worker_subtype_is_skipped_not_fatal() {
    let cfg = test_config();
    let broker = ScriptedBroker::new(vec![
        Step::Emit(json!({
            "type": "worker-lost", "hostname": "h1", "pid": 42, "timestamp": 100.0
        })),
        worker_online("h1", 42, 200.0),
    ]);

    let sender = Sender::new(cfg.bus_capacity_clamped());
    let mut rx = sender.subscribe();
    let pump = EventPump::spawn(broker, &cfg);
    let token = pump.cancellation();
    let runner = Runner::new(sender, EventFilter::NoFilter, &cfg);
    let handle = tokio::spawn(async move { runner.run(pump).await });

    let ev = next(&mut rx).await;
    assert_eq!(ev.action, Action::BringWorkerOnline);
    assert_eq!(ev.timestamp, 200.0);

    token.cancel();
    assert!(handle.await.unwrap().is_ok());
}

#[tokio::test]
async fn cancellation_stops_an_idle_pipeline() {
    let cfg = test_config();
    let broker = ScriptedBroker::new(vec![]);

    let sender = Sender::new(cfg.bus_capacity_clamped());
    let pump = EventPump::spawn(broker, &cfg);
    let token = pump.cancellation();
    let runner = Runner::new(sender, EventFilter::NoFilter, &cfg);
    let handle = tokio::spawn(async move { runner.run(pump).await });

    token.cancel();
    let res = timeout(Duration::from_secs(2), handle)
        .await
        .expect("runner should stop after cancellation")
        .unwrap();
    assert!(res.is_ok());
}

#[tokio::test]
async fn pump_state_tracks_liveness_as_a_side_effect() {
    let cfg = test_config();
    let broker = ScriptedBroker::new(vec![
        worker_online("h1", 42, 100.0),
        Step::Emit(json!({
            "type": "worker-offline", "hostname": "h1", "pid": 42, "timestamp": 300.0
        })),
        task_event("task-received", "u1", 400.0),
    ]);

    let sender = Sender::new(cfg.bus_capacity_clamped());
    let mut rx = sender.subscribe();
    let pump = EventPump::spawn(broker, &cfg);
    let token = pump.cancellation();
    let state = pump.state();
    let runner = Runner::new(sender, EventFilter::NoFilter, &cfg);
    let handle = tokio::spawn(async move { runner.run(pump).await });

    // Drain the pipeline so the folds are guaranteed to have happened.
    for _ in 0..3 {
        next(&mut rx).await;
    }

    assert!(!state.is_worker_online("h1.42"));
    assert_eq!(state.workers()["h1.42"].last_seen, 300.0);
    assert_eq!(state.tasks()["u1"].last_type, "task-received");

    token.cancel();
    assert!(handle.await.unwrap().is_ok());
}
