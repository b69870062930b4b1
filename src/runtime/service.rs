//! Triage service: a single-owner scheduler loop plus a cloneable handle.
//!
//! The [`TriageQueue`] lives inside one task that drains a bounded command channel, so
//! every mutation (enqueue, dequeue, rerank, match-and-remove) runs to completion
//! before the next starts. Classification, staff lookups, record persistence and event
//! publication all happen on the caller's side of the channel; the loop never awaits
//! network I/O.
//!
//! The loop also reranks on a fixed interval and, when the queue is at or above the
//! admission threshold, wakes a separate auto-assignment task through a [`Notify`].

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio::sync::{mpsc, oneshot, Notify};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use super::api::{AssignmentReport, RegistrationReceipt, RegistrationRequest};
use super::Spawn;
use crate::config::TriageConfig;
use crate::core::{
    build_audit_event, events, Assignment, AssignmentScheduler, AuditAction, AuditSink,
    Classification, EventNotifier, NewPatientRecord, PatientRecord, PatientRef, PatientStatus,
    Placement, PriorityFunction, QueueBoardRow, QueueEntry, QueueStats, RecordStore, RecordUpdate,
    ResourcePool, Severity, SeverityClassifier, StaffDirectory, StaffRoster, TriageError,
    TriageQueue, Vitals, WaitTimeEstimator,
};
use crate::util::{Clock, PatientId, StaffId};

type Reply<T> = oneshot::Sender<T>;

enum Command {
    Enqueue {
        patient: PatientRef,
        vitals: Vitals,
        classification: Classification,
        pool: ResourcePool,
        reply: Reply<Result<Placement, TriageError>>,
    },
    Dequeue {
        id: PatientId,
        reply: Reply<Option<QueueEntry>>,
    },
    Rerank {
        reply: Reply<()>,
    },
    PeekTop {
        n: usize,
        reply: Reply<Vec<QueueEntry>>,
    },
    PositionOf {
        id: PatientId,
        reply: Reply<Option<usize>>,
    },
    Len {
        reply: Reply<usize>,
    },
    SnapshotAll {
        reply: Reply<Vec<QueueEntry>>,
    },
    Stats {
        reply: Reply<QueueStats>,
    },
    Board {
        pool: ResourcePool,
        severity: Option<Severity>,
        reply: Reply<Vec<QueueBoardRow>>,
    },
    EstimateWait {
        id: PatientId,
        pool: ResourcePool,
        reply: Reply<Option<u64>>,
    },
    TryAssign {
        roster: StaffRoster,
        gated: bool,
        reply: Reply<Vec<Assignment>>,
    },
    AssignNext {
        roster: StaffRoster,
        doctor_id: StaffId,
        reply: Reply<Result<Option<Assignment>, TriageError>>,
    },
    StatusChanged {
        id: PatientId,
        from: PatientStatus,
        to: PatientStatus,
        reply: Reply<Option<QueueEntry>>,
    },
    Shutdown,
}

/// State owned by the scheduler loop.
struct SchedulerLoop {
    queue: TriageQueue,
    scheduler: AssignmentScheduler,
    audit: Box<dyn AuditSink>,
    assign_signal: Arc<Notify>,
    auto_assign: bool,
}

impl SchedulerLoop {
    async fn run(mut self, mut commands: mpsc::Receiver<Command>, rerank_every: Duration) {
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + rerank_every, rerank_every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(rerank_secs = rerank_every.as_secs(), "triage scheduler loop started");
        loop {
            tokio::select! {
                cmd = commands.recv() => match cmd {
                    Some(Command::Shutdown) | None => break,
                    Some(cmd) => self.handle(cmd),
                },
                _ = ticker.tick() => {
                    self.queue.rerank();
                    debug!(queue_len = self.queue.len(), "periodic rerank");
                    self.signal_if_due();
                }
            }
        }
        // Wake the auto-assignment task so it notices the channel is gone.
        self.assign_signal.notify_one();
        info!(queue_len = self.queue.len(), "triage scheduler loop stopped");
    }

    fn signal_if_due(&self) {
        if self.auto_assign
            && !self.queue.is_empty()
            && self.queue.len() >= self.scheduler.min_queue_threshold()
        {
            self.assign_signal.notify_one();
        }
    }

    fn audit(&mut self, id: &PatientId, action: AuditAction, payload: Option<String>) {
        let at = self.queue.now_ms();
        self.audit.record(build_audit_event(id.clone(), action, payload, at));
    }

    #[allow(clippy::too_many_lines)]
    fn handle(&mut self, cmd: Command) {
        match cmd {
            Command::Enqueue {
                patient,
                vitals,
                classification,
                pool,
                reply,
            } => {
                let id = patient.id.clone();
                let result = self
                    .queue
                    .enqueue(patient, vitals, classification.severity, &pool);
                if let Ok(placement) = &result {
                    if classification.degraded {
                        self.audit(&id, AuditAction::ClassifierFallback, None);
                    }
                    self.audit(
                        &id,
                        AuditAction::Enqueued,
                        Some(format!("{} at position {}", placement.severity, placement.position)),
                    );
                    self.signal_if_due();
                }
                let _ = reply.send(result);
            }
            Command::Dequeue { id, reply } => {
                let removed = self.queue.dequeue(&id);
                if removed.is_some() {
                    self.audit(&id, AuditAction::Removed, None);
                }
                let _ = reply.send(removed);
            }
            Command::Rerank { reply } => {
                self.queue.rerank();
                let _ = reply.send(());
            }
            Command::PeekTop { n, reply } => {
                let _ = reply.send(self.queue.peek_top(n));
            }
            Command::PositionOf { id, reply } => {
                let _ = reply.send(self.queue.position_of(&id));
            }
            Command::Len { reply } => {
                let _ = reply.send(self.queue.len());
            }
            Command::SnapshotAll { reply } => {
                let _ = reply.send(self.queue.snapshot_all());
            }
            Command::Stats { reply } => {
                let _ = reply.send(self.queue.stats());
            }
            Command::Board {
                pool,
                severity,
                reply,
            } => {
                let rows = match severity {
                    Some(s) => self.queue.by_severity(s, &pool),
                    None => self.queue.board(&pool),
                };
                let _ = reply.send(rows);
            }
            Command::EstimateWait { id, pool, reply } => {
                let _ = reply.send(self.queue.estimate_for(&id, &pool));
            }
            Command::TryAssign {
                mut roster,
                gated,
                reply,
            } => {
                let assignments = if gated {
                    self.scheduler.try_assign(&mut self.queue, &mut roster)
                } else {
                    self.scheduler.assign_all(&mut self.queue, &mut roster)
                };
                for a in &assignments {
                    self.audit(&a.patient_id, AuditAction::Assigned, Some(a.doctor.id.to_string()));
                }
                let _ = reply.send(assignments);
            }
            Command::AssignNext {
                mut roster,
                doctor_id,
                reply,
            } => {
                let result = self
                    .scheduler
                    .assign_next(&mut self.queue, &mut roster, &doctor_id);
                if let Ok(Some(a)) = &result {
                    self.audit(&a.patient_id, AuditAction::Assigned, Some(a.doctor.id.to_string()));
                }
                let _ = reply.send(result);
            }
            Command::StatusChanged {
                id,
                from,
                to,
                reply,
            } => {
                let removed = if to.leaves_queue() {
                    self.queue.dequeue(&id)
                } else {
                    None
                };
                if removed.is_some() {
                    self.audit(&id, AuditAction::Removed, Some(format!("status {to}")));
                }
                self.audit(&id, AuditAction::StatusChanged, Some(format!("{from} -> {to}")));
                let _ = reply.send(removed);
            }
            Command::Shutdown => {}
        }
    }
}

/// Collaborators injected into the service.
pub struct TriageService {
    config: TriageConfig,
    classifier: SeverityClassifier,
    clock: Arc<dyn Clock>,
    records: Arc<dyn RecordStore>,
    staff: Arc<dyn StaffDirectory>,
    notifier: Arc<dyn EventNotifier>,
    audit: Box<dyn AuditSink>,
}

impl TriageService {
    /// Assemble a service from validated configuration and collaborators.
    #[must_use]
    pub fn new(
        config: TriageConfig,
        classifier: SeverityClassifier,
        clock: Arc<dyn Clock>,
        records: Arc<dyn RecordStore>,
        staff: Arc<dyn StaffDirectory>,
        notifier: Arc<dyn EventNotifier>,
        audit: Box<dyn AuditSink>,
    ) -> Self {
        Self {
            config,
            classifier,
            clock,
            records,
            staff,
            notifier,
            audit,
        }
    }

    /// Spawn the scheduler loop and auto-assignment task and return a handle.
    pub fn start<S: Spawn>(self, spawner: &S) -> TriageHandle {
        let sched_cfg = &self.config.scheduler;
        let (tx, rx) = mpsc::channel(sched_cfg.command_buffer.max(1));
        let assign_signal = Arc::new(Notify::new());

        let queue = TriageQueue::new(
            PriorityFunction::new(self.config.priority.clone()),
            WaitTimeEstimator::new(self.config.estimator.clone()),
            Arc::clone(&self.clock),
            sched_cfg.max_queue_depth,
        );
        let worker = SchedulerLoop {
            queue,
            scheduler: AssignmentScheduler::new(sched_cfg.min_queue_threshold),
            audit: self.audit,
            assign_signal: Arc::clone(&assign_signal),
            auto_assign: sched_cfg.auto_assign,
        };
        spawner.spawn(worker.run(rx, Duration::from_secs(sched_cfg.rerank_interval_secs.max(1))));

        let handle = TriageHandle {
            commands: tx,
            shared: Arc::new(Shared {
                classifier: self.classifier,
                clock: self.clock,
                records: self.records,
                staff: self.staff,
                notifier: self.notifier,
                assign_signal,
            }),
        };
        if sched_cfg.auto_assign {
            spawner.spawn(auto_assign_loop(
                handle.commands.downgrade(),
                Arc::clone(&handle.shared),
            ));
        }
        handle
    }
}

/// Runs gated passes when signalled. Holds only a weak sender, so dropping every
/// [`TriageHandle`] still lets the scheduler loop stop.
async fn auto_assign_loop(commands: mpsc::WeakSender<Command>, shared: Arc<Shared>) {
    loop {
        shared.assign_signal.notified().await;
        let Some(commands) = commands.upgrade() else {
            break;
        };
        let handle = TriageHandle {
            commands,
            shared: Arc::clone(&shared),
        };
        let outcome = handle.try_assign().await;
        drop(handle);
        match outcome {
            Ok(report) if report.total > 0 => {
                info!(total = report.total, critical = report.critical, "auto-assignment pass");
            }
            Ok(_) => {}
            Err(TriageError::ServiceStopped) => break,
            Err(e) => warn!(error = %e, "auto-assignment pass failed"),
        }
    }
    debug!("auto-assignment task stopped");
}

struct Shared {
    classifier: SeverityClassifier,
    clock: Arc<dyn Clock>,
    records: Arc<dyn RecordStore>,
    staff: Arc<dyn StaffDirectory>,
    notifier: Arc<dyn EventNotifier>,
    assign_signal: Arc<Notify>,
}

/// Cloneable handle to a running triage service.
#[derive(Clone)]
pub struct TriageHandle {
    commands: mpsc::Sender<Command>,
    shared: Arc<Shared>,
}

impl TriageHandle {
    async fn request<T>(&self, make: impl FnOnce(Reply<T>) -> Command) -> Result<T, TriageError> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(make(tx))
            .await
            .map_err(|_| TriageError::ServiceStopped)?;
        rx.await.map_err(|_| TriageError::ServiceStopped)
    }

    async fn publish(&self, event: &str, payload: serde_json::Value) {
        if let Err(e) = self.shared.notifier.publish(event, payload).await {
            warn!(event, error = %e, "event publication failed");
        }
    }

    async fn roster(&self) -> Result<StaffRoster, TriageError> {
        Ok(StaffRoster::from_staff(
            self.shared.staff.list_available_staff().await?,
        ))
    }

    /// Current resource counts; an unreachable directory counts as no staff.
    async fn pool(&self) -> ResourcePool {
        match self.roster().await {
            Ok(roster) => roster.pool(),
            Err(e) => {
                warn!(error = %e, "staff directory unavailable, estimating with no staff");
                ResourcePool::default()
            }
        }
    }

    /// Register a new patient: create the record, classify, queue, and report.
    ///
    /// The record is marked Queued before the patient enters the queue, so an
    /// assignment pass that picks the patient up straight away always persists last.
    /// When the queue refuses the patient the new record is deleted again.
    ///
    /// # Errors
    ///
    /// Invalid input (missing name or vitals) is rejected before anything is stored.
    /// [`TriageError::QueueFull`] and [`TriageError::ServiceStopped`] are returned after
    /// the record has been removed.
    pub async fn register(&self, req: RegistrationRequest) -> Result<RegistrationReceipt, TriageError> {
        if req.contact.name.trim().is_empty() {
            return Err(TriageError::InvalidInput("contact name is required".into()));
        }
        let reading = req.vitals.reading()?;

        let records = &self.shared.records;
        let id = records
            .create_record(NewPatientRecord {
                contact: req.contact.clone(),
                vitals: req.vitals.clone(),
                notes: req.notes.clone(),
            })
            .await?;

        let classification = self.shared.classifier.classify_detailed(&reading).await;
        let queued = RecordUpdate {
            severity: Some(classification.severity),
            status: Some(PatientStatus::Queued),
            ..RecordUpdate::default()
        };
        if let Err(e) = records.update_record(&id, queued).await {
            warn!(patient_id = %id, error = %e, "failed to persist queued status");
        }

        let pool = self.pool().await;
        let patient = PatientRef {
            id: id.clone(),
            contact: req.contact,
            notes: req.notes,
        };
        let enqueued = self
            .request(|reply| Command::Enqueue {
                patient,
                vitals: req.vitals,
                classification,
                pool,
                reply,
            })
            .await
            .and_then(|r| r);
        let placement = match enqueued {
            Ok(placement) => placement,
            Err(e) => {
                self.discard_record(&id, &e).await;
                return Err(e);
            }
        };

        let position = RecordUpdate {
            queue_position: Some(placement.position),
            ..RecordUpdate::default()
        };
        if let Err(e) = records.update_record(&id, position).await {
            warn!(patient_id = %id, error = %e, "failed to persist queue position");
        }
        self.publish(
            events::PATIENT_QUEUED,
            json!({
                "patientId": id,
                "severity": placement.severity,
                "position": placement.position,
                "estimatedWaitMinutes": placement.estimated_wait_minutes,
            }),
        )
        .await;

        info!(
            patient_id = %id,
            severity = %placement.severity,
            position = placement.position,
            source = ?classification.source,
            "patient registered"
        );
        Ok(RegistrationReceipt {
            message: format!(
                "Patient registered with {} severity. Position in queue: {}",
                placement.severity, placement.position
            ),
            patient_id: id,
            severity: placement.severity,
            status: PatientStatus::Queued,
            position: placement.position,
            estimated_wait_minutes: placement.estimated_wait_minutes,
        })
    }

    async fn discard_record(&self, id: &PatientId, cause: &TriageError) {
        // A duplicate id means the record belongs to a patient who is already queued.
        if matches!(cause, TriageError::DuplicatePatient(_)) {
            return;
        }
        match self.shared.records.delete_record(id).await {
            Ok(_) => debug!(patient_id = %id, error = %cause, "discarded unqueued record"),
            Err(e) => warn!(patient_id = %id, error = %e, "failed to discard unqueued record"),
        }
    }

    /// Classify and queue a patient whose record already exists elsewhere.
    ///
    /// # Errors
    ///
    /// Invalid vitals, a duplicate id, or a full queue.
    pub async fn enqueue(&self, patient: PatientRef, vitals: Vitals) -> Result<Placement, TriageError> {
        let reading = vitals.reading()?;
        let classification = self.shared.classifier.classify_detailed(&reading).await;
        let pool = self.pool().await;
        self.request(|reply| Command::Enqueue {
            patient,
            vitals,
            classification,
            pool,
            reply,
        })
        .await?
    }

    /// Remove a patient from the queue. `None` if not queued.
    ///
    /// # Errors
    ///
    /// [`TriageError::ServiceStopped`] once the scheduler loop has stopped.
    pub async fn dequeue(&self, id: &PatientId) -> Result<Option<QueueEntry>, TriageError> {
        let id = id.clone();
        let removed = self
            .request(|reply| Command::Dequeue { id, reply })
            .await?;
        if let Some(entry) = &removed {
            self.publish(events::QUEUE_UPDATED, json!({ "removed": entry.patient.id }))
                .await;
        }
        Ok(removed)
    }

    /// Recompute scores and order now.
    ///
    /// # Errors
    ///
    /// [`TriageError::ServiceStopped`] once the scheduler loop has stopped.
    pub async fn rerank(&self) -> Result<(), TriageError> {
        self.request(|reply| Command::Rerank { reply }).await
    }

    /// The `n` highest-priority entries.
    ///
    /// # Errors
    ///
    /// [`TriageError::ServiceStopped`] once the scheduler loop has stopped.
    pub async fn peek_top(&self, n: usize) -> Result<Vec<QueueEntry>, TriageError> {
        self.request(|reply| Command::PeekTop { n, reply }).await
    }

    /// 1-based position of a queued patient.
    ///
    /// # Errors
    ///
    /// [`TriageError::ServiceStopped`] once the scheduler loop has stopped.
    pub async fn position_of(&self, id: &PatientId) -> Result<Option<usize>, TriageError> {
        let id = id.clone();
        self.request(|reply| Command::PositionOf { id, reply }).await
    }

    /// Number of waiting patients.
    ///
    /// # Errors
    ///
    /// [`TriageError::ServiceStopped`] once the scheduler loop has stopped.
    pub async fn len(&self) -> Result<usize, TriageError> {
        self.request(|reply| Command::Len { reply }).await
    }

    /// Whether nobody is waiting.
    ///
    /// # Errors
    ///
    /// [`TriageError::ServiceStopped`] once the scheduler loop has stopped.
    pub async fn is_empty(&self) -> Result<bool, TriageError> {
        Ok(self.len().await? == 0)
    }

    /// Every entry in priority order.
    ///
    /// # Errors
    ///
    /// [`TriageError::ServiceStopped`] once the scheduler loop has stopped.
    pub async fn snapshot_all(&self) -> Result<Vec<QueueEntry>, TriageError> {
        self.request(|reply| Command::SnapshotAll { reply }).await
    }

    /// Queue wait statistics.
    ///
    /// # Errors
    ///
    /// [`TriageError::ServiceStopped`] once the scheduler loop has stopped.
    pub async fn stats(&self) -> Result<QueueStats, TriageError> {
        self.request(|reply| Command::Stats { reply }).await
    }

    /// Waiting-room board with remaining-wait estimates.
    ///
    /// # Errors
    ///
    /// [`TriageError::ServiceStopped`] once the scheduler loop has stopped.
    pub async fn board(&self) -> Result<Vec<QueueBoardRow>, TriageError> {
        let pool = self.pool().await;
        self.request(|reply| Command::Board {
            pool,
            severity: None,
            reply,
        })
        .await
    }

    /// Board rows for one tier.
    ///
    /// # Errors
    ///
    /// [`TriageError::ServiceStopped`] once the scheduler loop has stopped.
    pub async fn by_severity(&self, severity: Severity) -> Result<Vec<QueueBoardRow>, TriageError> {
        let pool = self.pool().await;
        self.request(|reply| Command::Board {
            pool,
            severity: Some(severity),
            reply,
        })
        .await
    }

    /// Remaining-wait estimate for a queued patient.
    ///
    /// # Errors
    ///
    /// [`TriageError::ServiceStopped`] once the scheduler loop has stopped.
    pub async fn estimate_wait(&self, id: &PatientId) -> Result<Option<u64>, TriageError> {
        let pool = self.pool().await;
        let id = id.clone();
        self.request(|reply| Command::EstimateWait { id, pool, reply })
            .await
    }

    /// Run one threshold-gated batch assignment pass against fresh staff availability.
    ///
    /// # Errors
    ///
    /// [`TriageError::Backend`] when the staff directory fails, or
    /// [`TriageError::ServiceStopped`].
    pub async fn try_assign(&self) -> Result<AssignmentReport, TriageError> {
        self.batch(true).await
    }

    /// Staff-initiated batch: match every available doctor to the top of the queue,
    /// however few patients are waiting.
    ///
    /// # Errors
    ///
    /// Same as [`TriageHandle::try_assign`].
    pub async fn assign_all(&self) -> Result<AssignmentReport, TriageError> {
        self.batch(false).await
    }

    async fn batch(&self, gated: bool) -> Result<AssignmentReport, TriageError> {
        let roster = self.roster().await?;
        let assignments = self
            .request(|reply| Command::TryAssign {
                roster,
                gated,
                reply,
            })
            .await?;
        for a in &assignments {
            self.persist_assignment(a).await;
        }
        Ok(AssignmentReport::from_assignments(assignments))
    }

    /// Give the highest-priority patient to a specific doctor, ignoring the threshold.
    ///
    /// # Errors
    ///
    /// [`TriageError::StaffUnavailable`] when the doctor is unknown or busy.
    pub async fn assign_next(&self, doctor_id: &StaffId) -> Result<Option<Assignment>, TriageError> {
        let roster = self.roster().await?;
        let doctor_id = doctor_id.clone();
        let assignment = self
            .request(|reply| Command::AssignNext {
                roster,
                doctor_id,
                reply,
            })
            .await??;
        if let Some(a) = &assignment {
            self.persist_assignment(a).await;
        }
        Ok(assignment)
    }

    async fn persist_assignment(&self, a: &Assignment) {
        let update = RecordUpdate {
            status: Some(PatientStatus::Assigned),
            assignment: Some(a.clone()),
            ..RecordUpdate::default()
        };
        if let Err(e) = self.shared.records.update_record(&a.patient_id, update).await {
            warn!(patient_id = %a.patient_id, error = %e, "failed to persist assignment");
        }
        let payload = serde_json::to_value(a).unwrap_or_else(|e| {
            error!(error = %e, "assignment serialization failed");
            json!({ "patientId": a.patient_id })
        });
        self.publish(events::PATIENT_ASSIGNED, payload).await;
    }

    /// Move a patient's record to `status`.
    ///
    /// Statuses from Assigned onwards take the patient out of the queue; Completed
    /// stamps the completion time.
    ///
    /// # Errors
    ///
    /// [`TriageError::UnknownPatient`] for a missing record and
    /// [`TriageError::InvalidTransition`] for a disallowed change.
    pub async fn update_status(
        &self,
        id: &PatientId,
        status: PatientStatus,
    ) -> Result<PatientRecord, TriageError> {
        let record = self
            .shared
            .records
            .get_record(id)
            .await?
            .ok_or_else(|| TriageError::UnknownPatient(id.clone()))?;
        let from = record.status;
        from.check_transition(status)?;

        let patient = id.clone();
        self.request(|reply| Command::StatusChanged {
            id: patient,
            from,
            to: status,
            reply,
        })
        .await?;

        let update = RecordUpdate {
            status: Some(status),
            completed_at_ms: (status == PatientStatus::Completed && record.completed_at_ms.is_none())
                .then(|| self.shared.clock.now_ms()),
            ..RecordUpdate::default()
        };
        self.shared.records.update_record(id, update).await?;
        self.publish(
            events::PATIENT_STATUS_UPDATED,
            json!({ "patientId": id, "from": from, "to": status }),
        )
        .await;
        info!(patient_id = %id, from = %from, to = %status, "status updated");

        self.shared
            .records
            .get_record(id)
            .await?
            .ok_or_else(|| TriageError::UnknownPatient(id.clone()))
    }

    /// Stop the scheduler loop. Later calls fail with [`TriageError::ServiceStopped`].
    pub async fn shutdown(&self) {
        if self.commands.send(Command::Shutdown).await.is_err() {
            debug!("scheduler loop already stopped");
        }
        self.shared.assign_signal.notify_one();
    }
}
