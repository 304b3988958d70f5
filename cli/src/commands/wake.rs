use wolagent_common::network::target::WakeTarget;
use wolagent_core::wake::MagicPacketSender;

use crate::terminal::print;

pub async fn wake(mac: &str, broadcast: &str) -> anyhow::Result<()> {
    let target = WakeTarget::parse(mac, Some(broadcast))?;
    print::aligned_line("MAC", target.mac.to_string(), 9);
    print::aligned_line("Broadcast", broadcast, 9);

    MagicPacketSender::default().send(broadcast, mac).await?;
    print::print_status("Magic packet sent");
    Ok(())
}
