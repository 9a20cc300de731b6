//! Trimpot - Runtime Parameter Console Firmware
//!
//! Firmware binary for RP2040-based hoverboard controller boards.
//! Exposes the controller's configuration and telemetry over a serial
//! line console, persisted to flash.
//!
//! Named after the trimmer potentiometer: a screw-adjusted knob for
//! tuning a board after assembly.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::flash::Flash;
use embassy_rp::peripherals::UART0;
use embassy_rp::uart::{BufferedInterruptHandler, Config as UartConfig, Uart};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use trimpot_core::board::BoardState;

mod storage;
mod tasks;

bind_interrupts!(struct Irqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
});

// Static cells for UART buffers (must live forever)
static TX_BUF: StaticCell<[u8; 1024]> = StaticCell::new();
static RX_BUF: StaticCell<[u8; 256]> = StaticCell::new();

/// Controller memory shared between the motor control and the console
static BOARD: BoardState = BoardState::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Trimpot firmware starting...");

    // Initialize RP2040 peripherals
    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    // Parameter partition at the end of flash
    let flash = Flash::new(p.FLASH, p.DMA_CH0);

    // Setup UART for the operator console
    let mut uart_config = UartConfig::default();
    uart_config.baudrate = 115200;

    let tx_buf = TX_BUF.init([0u8; 1024]);
    let rx_buf = RX_BUF.init([0u8; 256]);

    let uart = Uart::new_blocking(p.UART0, p.PIN_0, p.PIN_1, uart_config);
    let uart = uart.into_buffered(Irqs, tx_buf, rx_buf);
    let (tx, rx) = uart.split();
    info!("UART initialized for console");

    spawner
        .spawn(tasks::console_task(tx, rx, flash, &BOARD))
        .unwrap();

    info!("All tasks spawned, firmware running");

    loop {
        embassy_time::Timer::after_secs(60).await;
        trace!("Main loop heartbeat");
    }
}
