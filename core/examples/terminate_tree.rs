//! Start a shell tree in the background, then tear it down
//!
//! The shell ignores SIGTERM, so termination escalates to SIGKILL after
//! the patience runs out.

use pgroup_core::process::{background, ProcessCommand};
use pgroup_core::Result;
use std::time::Duration;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    pgroup_core::utils::init_tracing("debug")?;

    let mut cmd = ProcessCommand::new("sh");
    cmd.args(["-c", "trap '' TERM; sleep 30 & sleep 30 & wait"]);

    let mut group = background(&mut cmd).await?;
    info!("Started process group {}", group.id());
    info!("Leader of its own group: {}", group.is_leader()?);

    tokio::time::sleep(Duration::from_millis(200)).await;

    group.terminate(Duration::from_secs(1)).await?;
    let exit = group.wait().await?;
    info!("Group torn down: {}", exit);

    Ok(())
}
