// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::{debug, trace};

use crate::error::HarnessError;
use crate::status::StatusSource;

/// Delay between status polls.
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// How long machines get to come up before a unit wait starts counting.
pub const MACHINE_STARTUP_TIMEOUT: Duration = Duration::from_secs(300);

/// The bootstrap machine; it hosts the state server, not workloads.
const BOOTSTRAP_MACHINE: &str = "0";

/// Wait for `num_machines` workload machines to be running.
///
/// The bootstrap machine is not counted. On the local provider (machine 0
/// resolves to `localhost`) there are no machines to wait for and the
/// wait returns immediately. Returns the number of running machines and
/// the time it took them to come up.
pub async fn wait_for_machine(
	source: &dyn StatusSource,
	num_machines: usize,
	timeout: Duration,
) -> Result<(usize, Duration), HarnessError> {
	let first = source.status().await?;
	let local = first
		.machines
		.get(BOOTSTRAP_MACHINE)
		.and_then(|machine| machine.dns_name.as_deref())
		== Some("localhost");
	if local {
		debug!("local provider detected; no machines to wait for");
		return Ok((1, Duration::ZERO));
	}

	let start = Instant::now();
	loop {
		let status = source.status().await?;
		let workload_machines: Vec<_> = status
			.machines
			.iter()
			.filter(|(id, _)| id.as_str() != BOOTSTRAP_MACHINE)
			.collect();

		let running = workload_machines
			.iter()
			.filter(|(_, machine)| machine.instance_state.as_deref() == Some("running"))
			.count();

		trace!(running, wanted = num_machines, "polling machines");

		if workload_machines.len() >= num_machines && running == workload_machines.len() {
			return Ok((running, start.elapsed()));
		}

		if start.elapsed() >= timeout {
			return Err(HarnessError::Timeout {
				waiting_for: format!("{num_machines} machine(s) to start"),
				timeout,
			});
		}
		sleep(POLL_INTERVAL).await;
	}
}

/// Wait for a service's unit to reach agent-state `started`.
///
/// An agent-state containing `error` fails immediately; polling past a
/// hook failure only hides it.
pub async fn wait_for_unit(
	source: &dyn StatusSource,
	service: &str,
	timeout: Duration,
) -> Result<(), HarnessError> {
	wait_for_machine(source, 1, MACHINE_STARTUP_TIMEOUT).await?;

	let start = Instant::now();
	loop {
		let status = source.status().await?;
		if let Some(state) = status.agent_state(service, None) {
			trace!(service = %service, state = %state, "polling unit");

			if state.contains("error") {
				return Err(HarnessError::UnitError {
					service: service.to_string(),
					state: state.to_string(),
				});
			}
			if state == "started" {
				debug!(service = %service, "unit started");
				return Ok(());
			}
		}

		if start.elapsed() >= timeout {
			return Err(HarnessError::Timeout {
				waiting_for: format!("unit of service '{service}' to start"),
				timeout,
			});
		}
		sleep(POLL_INTERVAL).await;
	}
}

/// Wait for a relation on a service to come up.
pub async fn wait_for_relation(
	source: &dyn StatusSource,
	service: &str,
	relation: &str,
	timeout: Duration,
) -> Result<(), HarnessError> {
	let start = Instant::now();
	loop {
		let status = source.status().await?;
		if status.relation_state(service, relation) == Some("up") {
			debug!(service = %service, relation = %relation, "relation up");
			return Ok(());
		}

		if start.elapsed() >= timeout {
			return Err(HarnessError::Timeout {
				waiting_for: format!("relation '{relation}' on service '{service}'"),
				timeout,
			});
		}
		sleep(POLL_INTERVAL).await;
	}
}

/// Wait until a page's body satisfies `validate`.
///
/// Connection failures and HTTP errors are retried until the timeout;
/// a workload that is still binding its port looks exactly like one that
/// is down.
pub async fn wait_for_page<F>(
	client: &reqwest::Client,
	url: &str,
	timeout: Duration,
	validate: F,
) -> Result<String, HarnessError>
where
	F: Fn(&str) -> bool,
{
	let start = Instant::now();
	loop {
		match client.get(url).send().await {
			Ok(response) => {
				if let Ok(body) = response.text().await {
					if validate(&body) {
						return Ok(body);
					}
					trace!(url = %url, "page up, contents not ready");
				}
			}
			Err(err) => {
				trace!(url = %url, error = %err, "page not reachable yet");
			}
		}

		if start.elapsed() >= timeout {
			return Err(HarnessError::Timeout {
				waiting_for: format!("contents of {url}"),
				timeout,
			});
		}
		sleep(POLL_INTERVAL).await;
	}
}

/// Wait until a page's body contains `contents`, returning the body.
pub async fn wait_for_page_contents(
	client: &reqwest::Client,
	url: &str,
	contents: &str,
	timeout: Duration,
) -> Result<String, HarnessError> {
	wait_for_page(client, url, timeout, |body| body.contains(contents)).await
}

#[cfg(test)]
mod tests {
	use super::*;
	use async_trait::async_trait;
	use std::sync::atomic::{AtomicUsize, Ordering};
	use tokio::io::{AsyncReadExt, AsyncWriteExt};

	use crate::status::Status;

	/// StatusSource that replays a fixed sequence, repeating the last
	/// document once exhausted.
	struct ReplaySource {
		documents: Vec<Status>,
		cursor: AtomicUsize,
	}

	impl ReplaySource {
		fn new(documents: &[&str]) -> Self {
			Self {
				documents: documents
					.iter()
					.map(|doc| serde_yaml::from_str(doc).expect("replay doc must parse"))
					.collect(),
				cursor: AtomicUsize::new(0),
			}
		}
	}

	#[async_trait]
	impl StatusSource for ReplaySource {
		async fn status(&self) -> Result<Status, HarnessError> {
			let index = self.cursor.fetch_add(1, Ordering::SeqCst);
			Ok(self.documents[index.min(self.documents.len() - 1)].clone())
		}
	}

	const LOCAL: &str = r#"
machines:
  "0":
    dns-name: localhost
"#;

	const BOOTING: &str = r#"
machines:
  "0":
    dns-name: ec2-0.example.com
    instance-state: running
  "1":
    dns-name: ec2-1.example.com
    instance-state: pending
"#;

	const RUNNING: &str = r#"
machines:
  "0":
    dns-name: ec2-0.example.com
    instance-state: running
  "1":
    dns-name: ec2-1.example.com
    instance-state: running
services:
  wordpress:
    units:
      wordpress/0:
        agent-state: pending
"#;

	const STARTED: &str = r#"
machines:
  "0":
    dns-name: ec2-0.example.com
    instance-state: running
  "1":
    dns-name: ec2-1.example.com
    instance-state: running
services:
  wordpress:
    units:
      wordpress/0:
        agent-state: started
        relations:
          db:
            state: up
"#;

	const HOOK_ERROR: &str = r#"
machines:
  "0":
    dns-name: ec2-0.example.com
    instance-state: running
  "1":
    dns-name: ec2-1.example.com
    instance-state: running
services:
  wordpress:
    units:
      wordpress/0:
        agent-state: install-error
"#;

	/// Test: the local provider short-circuits the machine wait.
	///
	/// Why this test is important: under the local provider machine 0 is
	/// the developer's own box; waiting 300 seconds for EC2 instances
	/// that will never appear would make the harness unusable locally.
	#[tokio::test(start_paused = true)]
	async fn test_wait_for_machine_local_provider() {
		let source = ReplaySource::new(&[LOCAL]);

		let (count, elapsed) = wait_for_machine(&source, 1, Duration::from_secs(300))
			.await
			.unwrap();

		assert_eq!(count, 1);
		assert_eq!(elapsed, Duration::ZERO);
	}

	/// Test: the machine wait skips the bootstrap machine and polls
	/// until the workload machines run.
	///
	/// Why this test is important: counting machine 0 would declare a
	/// deployment ready one machine early, and the pending→running
	/// transition is exactly what the poll loop exists to observe.
	#[tokio::test(start_paused = true)]
	async fn test_wait_for_machine_polls_until_running() {
		let source = ReplaySource::new(&[BOOTING, BOOTING, BOOTING, RUNNING]);

		let (count, _) = wait_for_machine(&source, 1, Duration::from_secs(300))
			.await
			.unwrap();

		assert_eq!(count, 1);
	}

	/// Test: the machine wait times out.
	#[tokio::test(start_paused = true)]
	async fn test_wait_for_machine_timeout() {
		let source = ReplaySource::new(&[BOOTING]);

		let err = wait_for_machine(&source, 1, Duration::from_secs(2))
			.await
			.unwrap_err();

		assert!(matches!(err, HarnessError::Timeout { .. }));
	}

	/// Test: the unit wait polls through pending to started.
	#[tokio::test(start_paused = true)]
	async fn test_wait_for_unit_until_started() {
		let source = ReplaySource::new(&[RUNNING, RUNNING, STARTED]);

		wait_for_unit(&source, "wordpress", Duration::from_secs(480))
			.await
			.unwrap();
	}

	/// Test: an error agent-state fails the unit wait immediately.
	///
	/// Why this test is important: a unit in `install-error` never
	/// reaches `started`; polling until the timeout would bury the hook
	/// failure under a misleading timeout error.
	#[tokio::test(start_paused = true)]
	async fn test_wait_for_unit_error_state() {
		let source = ReplaySource::new(&[HOOK_ERROR]);

		let err = wait_for_unit(&source, "wordpress", Duration::from_secs(480))
			.await
			.unwrap_err();

		match err {
			HarnessError::UnitError { service, state } => {
				assert_eq!(service, "wordpress");
				assert_eq!(state, "install-error");
			}
			other => panic!("expected UnitError, got {other:?}"),
		}
	}

	/// Test: a service absent from status keeps the unit wait polling
	/// instead of failing.
	#[tokio::test(start_paused = true)]
	async fn test_wait_for_unit_waits_for_service_to_appear() {
		let source = ReplaySource::new(&[RUNNING, RUNNING, BOOTING, STARTED]);

		wait_for_unit(&source, "wordpress", Duration::from_secs(480))
			.await
			.unwrap();
	}

	/// Test: the relation wait completes once the relation is up.
	#[tokio::test(start_paused = true)]
	async fn test_wait_for_relation() {
		let source = ReplaySource::new(&[RUNNING, STARTED]);

		wait_for_relation(&source, "wordpress", "db", Duration::from_secs(120))
			.await
			.unwrap();
	}

	/// Test: the relation wait times out while the relation stays down.
	#[tokio::test(start_paused = true)]
	async fn test_wait_for_relation_timeout() {
		let source = ReplaySource::new(&[RUNNING]);

		let err = wait_for_relation(&source, "wordpress", "db", Duration::from_secs(1))
			.await
			.unwrap_err();

		assert!(matches!(err, HarnessError::Timeout { .. }));
	}

	async fn serve_page(body: &'static str) -> String {
		let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
		let addr = listener.local_addr().unwrap();

		tokio::spawn(async move {
			while let Ok((mut socket, _)) = listener.accept().await {
				tokio::spawn(async move {
					let mut buf = [0u8; 1024];
					let _ = socket.read(&mut buf).await;
					let response = format!(
						"HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
						body.len(),
						body
					);
					let _ = socket.write_all(response.as_bytes()).await;
					let _ = socket.shutdown().await;
				});
			}
		});

		format!("http://{addr}/")
	}

	/// Test: the page wait returns the body once the contents appear.
	#[tokio::test]
	async fn test_wait_for_page_contents() {
		let url = serve_page("<html>It works!</html>").await;
		let client = reqwest::Client::new();

		let body = wait_for_page_contents(&client, &url, "It works!", Duration::from_secs(5))
			.await
			.unwrap();

		assert!(body.contains("It works!"));
	}

	/// Test: the page wait times out when the contents never appear.
	#[tokio::test]
	async fn test_wait_for_page_contents_timeout() {
		let url = serve_page("maintenance page").await;
		let client = reqwest::Client::new();

		let err = wait_for_page_contents(&client, &url, "It works!", Duration::from_millis(300))
			.await
			.unwrap_err();

		assert!(matches!(err, HarnessError::Timeout { .. }));
	}
}
