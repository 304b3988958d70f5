use wolagent_common::config::WaitPolicy;
use wolagent_core::reachability::{self, ReachabilityWaiter};

use crate::commands::Timing;
use crate::terminal::print;

pub async fn wait(host: &str, timing: Timing) -> anyhow::Result<()> {
    let policy = timing.policy(WaitPolicy::default())?;
    print::aligned_line("Host", host, 8);
    print::aligned_line("Interval", format!("{}ms", policy.poll_interval().as_millis()), 8);
    print::aligned_line("Timeout", format!("{}ms", policy.timeout().as_millis()), 8);

    let waiter = ReachabilityWaiter::new(reachability::default_prober());
    tokio::select! {
        result = waiter.wait_until_reachable(Some(host), &policy) => result?,
        _ = tokio::signal::ctrl_c() => anyhow::bail!("interrupted while waiting for {host}"),
    }

    print::print_status(format!("{host} is up"));
    Ok(())
}
