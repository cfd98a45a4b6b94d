//! Runs one course editing session as a tokio task.
//!
//! The task owns the [`ReorderController`] and the sync client. Author intents
//! arrive over a channel and keep being accepted while a persist call is in
//! flight, so they queue in the controller exactly as they would behind a slow
//! network. The current snapshot is published on a `watch` channel for the
//! presenter; commit, rollback and rejection events go out on a second channel.

use log::debug;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::managers::reorder_controller::{ControllerEvent, ReorderController, Submission};
use crate::services::sync_client::SyncClient;
use crate::types::delta::TabAction;
use crate::types::tab::TabSnapshot;

#[derive(Debug)]
enum SessionCommand {
    Submit(TabAction),
    Close,
}

/// The page's side of a running session.
pub struct SessionHandle {
    commands: mpsc::UnboundedSender<SessionCommand>,
    snapshots: watch::Receiver<TabSnapshot>,
    events: mpsc::UnboundedReceiver<ControllerEvent>,
}

impl SessionHandle {
    /// Send an author action. Returns false once the session has ended.
    pub fn submit(&self, action: TabAction) -> bool {
        self.commands.send(SessionCommand::Submit(action)).is_ok()
    }

    /// End the session. A persist already in flight still completes, but its
    /// result no longer changes anything.
    pub fn close(&self) {
        let _ = self.commands.send(SessionCommand::Close);
    }

    pub fn snapshot(&self) -> TabSnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<TabSnapshot> {
        self.snapshots.clone()
    }

    pub async fn next_event(&mut self) -> Option<ControllerEvent> {
        self.events.recv().await
    }

    pub fn try_next_event(&mut self) -> Option<ControllerEvent> {
        self.events.try_recv().ok()
    }
}

pub struct TabSession;

impl TabSession {
    /// Start the session task. The join handle yields the controller once the
    /// session has ended.
    pub fn spawn<C>(controller: ReorderController, client: C) -> (SessionHandle, JoinHandle<ReorderController>)
    where
        C: SyncClient + 'static,
    {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(controller.snapshot());

        let task = tokio::spawn(run(controller, client, command_rx, snapshot_tx, event_tx));

        let handle = SessionHandle {
            commands: command_tx,
            snapshots: snapshot_rx,
            events: event_rx,
        };
        (handle, task)
    }
}

struct Outputs {
    snapshots: watch::Sender<TabSnapshot>,
    events: mpsc::UnboundedSender<ControllerEvent>,
}

impl Outputs {
    fn publish(&self, controller: &ReorderController) {
        self.snapshots.send_replace(controller.snapshot());
    }

    fn emit(&self, event: ControllerEvent) {
        let _ = self.events.send(event);
    }
}

async fn run<C: SyncClient>(
    mut controller: ReorderController,
    client: C,
    mut commands: mpsc::UnboundedReceiver<SessionCommand>,
    snapshots: watch::Sender<TabSnapshot>,
    events: mpsc::UnboundedSender<ControllerEvent>,
) -> ReorderController {
    let out = Outputs { snapshots, events };
    let course_key = controller.course_key().clone();
    let mut accepting = true;

    loop {
        match controller.in_flight().cloned() {
            Some(delta) => {
                let mut persist = client.persist(&course_key, &delta);
                let outcome = loop {
                    tokio::select! {
                        outcome = &mut persist => break outcome,
                        command = commands.recv(), if accepting => {
                            accepting = handle_command(&mut controller, command, &out);
                        }
                    }
                };

                let resolved = controller.resolve(outcome);
                if controller.is_closed() {
                    debug!("[{}] discarded sync result after session end", course_key);
                    continue;
                }
                for event in resolved {
                    out.emit(event);
                }
                out.publish(&controller);
            }
            None if !accepting => break,
            None => {
                let command = commands.recv().await;
                accepting = handle_command(&mut controller, command, &out);
            }
        }
    }

    controller
}

/// Returns whether the session keeps accepting commands.
fn handle_command(
    controller: &mut ReorderController,
    command: Option<SessionCommand>,
    out: &Outputs,
) -> bool {
    match command {
        Some(SessionCommand::Submit(action)) => {
            match controller.submit(action.clone()) {
                Ok(Submission::InFlight(_)) => out.publish(controller),
                Ok(Submission::Queued(_)) | Ok(Submission::Ignored) => {}
                Err(error) => out.emit(ControllerEvent::ActionRejected { action, error }),
            }
            true
        }
        Some(SessionCommand::Close) | None => {
            controller.close();
            false
        }
    }
}
