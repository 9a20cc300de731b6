//! Serial console task
//!
//! Assembles operator lines from UART0, runs them through the console
//! and sends the replies back. Between lines it reports the watch list
//! every [`WATCH_INTERVAL_MS`].

use defmt::*;
use embassy_futures::select::{select, Either};
use embassy_rp::uart::{BufferedUartRx, BufferedUartTx};
use embassy_time::{Duration, Ticker};
use embedded_io_async::{Read, Write};
use heapless::String;

use trimpot_core::board::{self, BoardState};
use trimpot_core::persist::SENTINEL_ADDR;
use trimpot_core::{Console, Registry, COMMANDS};
use trimpot_protocol::LineParser;

use crate::storage::{ConfigFlash, FlashEeprom};

/// Buffer size for UART receive
const RX_BUF_SIZE: usize = 64;

/// Reply buffer; large enough for the full `HELP` listing
const OUT_BUF_SIZE: usize = 4096;

/// Period of unsolicited watch reports
pub const WATCH_INTERVAL_MS: u64 = 100;

/// Console task - owns the UART, the parameter store and the watch list
#[embassy_executor::task]
pub async fn console_task(
    mut tx: BufferedUartTx,
    mut rx: BufferedUartRx,
    mut flash: ConfigFlash,
    state: &'static BoardState,
) {
    info!("Console task started");

    let params = board::parameters(state);
    let registry = match Registry::new(&params, &COMMANDS) {
        Ok(registry) => registry,
        Err(e) => {
            error!("Invalid parameter table: {:?}", e);
            return;
        }
    };

    let slots = core::iter::once(SENTINEL_ADDR).chain(registry.persisted().map(|(_, slot)| slot));
    let store = FlashEeprom::load(&mut flash, slots).await;

    let mut console = Console::new(&registry, store);
    let changed = console.boot();
    state.refresh_input_limits();
    info!("Loaded {} parameters ({} changed)", registry.len(), changed);

    let mut parser = LineParser::new();
    let mut ticker = Ticker::every(Duration::from_millis(WATCH_INTERVAL_MS));
    let mut buf = [0u8; RX_BUF_SIZE];
    let mut out: String<OUT_BUF_SIZE> = String::new();

    loop {
        let event = select(rx.read(&mut buf), ticker.next()).await;

        match event {
            Either::First(Ok(n)) => {
                trace!("RX: {} bytes", n);

                for &byte in &buf[..n] {
                    match parser.feed(byte) {
                        Ok(Some(line)) => {
                            out.clear();
                            if let Err(e) = console.handle_line(line.as_bytes(), &mut out) {
                                debug!("Line rejected: {:?}", e);
                            }
                            send(&mut tx, &out).await;
                            flush_store(&mut console, &mut flash).await;
                        }
                        Ok(None) => {
                            // Need more bytes
                        }
                        Err(e) => {
                            warn!("Console line dropped: {:?}", e);
                        }
                    }
                }
            }
            Either::First(Err(e)) => {
                warn!("UART read error: {:?}", e);
            }
            Either::Second(()) => {
                out.clear();
                if let Ok(true) = console.report_watched(&mut out) {
                    send(&mut tx, &out).await;
                }
            }
        }
    }
}

/// Write a reply buffer to the UART
async fn send(tx: &mut BufferedUartTx, out: &str) {
    if out.is_empty() {
        return;
    }
    if let Err(e) = tx.write_all(out.as_bytes()).await {
        warn!("UART write error: {:?}", e);
    }
}

/// Push writes made by the last line out to flash
async fn flush_store(console: &mut Console<'_, FlashEeprom>, flash: &mut ConfigFlash) {
    if !console.store().has_pending() {
        return;
    }
    match console.store_mut().flush(flash).await {
        Ok(written) => info!("Stored {} cells to flash", written),
        Err(e) => warn!("Flash write failed: {:?}", e),
    }
}
