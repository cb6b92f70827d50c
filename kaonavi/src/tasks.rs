//! Acompanhamento de tasks assíncronas
//!
//! Escritas em massa (membros, sheets, departamentos) são enfileiradas pelo
//! serviço e devolvem um `task_id`. O poller consulta `GET /tasks/{id}` até
//! um estado terminal, respeitando intervalo, prazo total e cancelamento.

use std::time::Duration;

use tokio::time::{sleep, sleep_until, Instant};
use tokio_util::sync::CancellationToken;

use crate::client::{decode_json, KaonaviClient};
use crate::codec::TaggedEnum;
use crate::error::{KaonaviError, Result};
use crate::types::{TaskId, TaskProgress, TaskStatus};

/// Intervalo entre consultas e prazo total de espera
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub timeout: Duration,
}

impl PollPolicy {
    pub fn new(interval: Duration, timeout: Duration) -> Self {
        Self { interval, timeout }
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::new(Duration::from_secs(2), Duration::from_secs(300))
    }
}

/// Resultado de uma escrita que gera task
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    /// Task terminou com OK
    Completed { task_id: TaskId, messages: Vec<String> },
    /// Nada foi enviado (cliente em dry-run)
    DryRun,
}

impl TaskOutcome {
    pub fn task_id(&self) -> Option<TaskId> {
        match self {
            Self::Completed { task_id, .. } => Some(*task_id),
            Self::DryRun => None,
        }
    }

    pub fn is_dry_run(&self) -> bool {
        matches!(self, Self::DryRun)
    }
}

/// Operações sobre `/tasks`
pub struct TaskPoller<'a> {
    client: &'a KaonaviClient,
}

impl<'a> TaskPoller<'a> {
    pub(crate) fn new(client: &'a KaonaviClient) -> Self {
        Self { client }
    }

    /// Estado atual de uma task
    pub async fn progress(&self, task_id: TaskId) -> Result<TaskProgress> {
        self.fetch(task_id).await.map(|(progress, _)| progress)
    }

    /// Espera a task chegar a um estado terminal
    ///
    /// - OK → [`TaskOutcome::Completed`]
    /// - NG/ERROR → `TaskFailed` com as mensagens do serviço
    /// - prazo estourado (contado a partir desta chamada) → `TaskTimedOut`
    /// - `cancel` disparado → `Cancelled`, sem esperar o próximo intervalo
    pub async fn await_task(
        &self,
        task_id: TaskId,
        policy: PollPolicy,
        cancel: &CancellationToken,
    ) -> Result<TaskOutcome> {
        // prazo que não cabe num Instant equivale a esperar sem prazo
        let deadline = Instant::now().checked_add(policy.timeout);
        let mut attempts: u32 = 0;

        loop {
            let (progress, retry_hint) = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(KaonaviError::Cancelled { task_id }),
                _ = until(deadline) => return Err(timed_out(task_id, attempts)),
                fetched = self.fetch(task_id) => fetched?,
            };
            attempts += 1;

            match progress.status {
                TaskStatus::Ok => {
                    tracing::info!("✅ Kaonavi task {} completed after {} checks", task_id, attempts);
                    return Ok(TaskOutcome::Completed {
                        task_id,
                        messages: progress.messages,
                    });
                }
                TaskStatus::Ng | TaskStatus::Error => {
                    let reason = failure_reason(&progress);
                    tracing::warn!("❌ Kaonavi task {} failed: {}", task_id, reason);
                    return Err(KaonaviError::TaskFailed { task_id, reason });
                }
                TaskStatus::Waiting | TaskStatus::Running => {
                    tracing::debug!("Kaonavi task {} is {}", task_id, progress.status.tag());
                }
            }

            let wait = retry_hint.unwrap_or(policy.interval);

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(KaonaviError::Cancelled { task_id }),
                _ = until(deadline) => return Err(timed_out(task_id, attempts)),
                _ = sleep(wait) => {}
            }
        }
    }

    async fn fetch(&self, task_id: TaskId) -> Result<(TaskProgress, Option<Duration>)> {
        let path = format!("/tasks/{}", task_id);
        let response = self.client.read_raw(&path).await?;
        let progress: TaskProgress = decode_json(&response, &path)?;
        Ok((progress, response.retry_after()))
    }
}

async fn until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

fn timed_out(task_id: TaskId, attempts: u32) -> KaonaviError {
    tracing::warn!("⏱️ Kaonavi task {} still pending after {} checks", task_id, attempts);
    KaonaviError::TaskTimedOut { task_id }
}

fn failure_reason(progress: &TaskProgress) -> String {
    if progress.messages.is_empty() {
        format!("task finished with status {}", progress.status.tag())
    } else {
        progress.messages.join("; ")
    }
}
