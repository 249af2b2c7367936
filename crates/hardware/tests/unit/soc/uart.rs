//! UART unit tests.
//!
//! Verifies the 16550A register model, the host input/output queues, IER
//! gating of the receive interrupt, and the single-shot interrupt line.

use rv32virt_core::soc::devices::Uart;

const RHR: u64 = 0x1000_0000;
const THR: u64 = 0x1000_0000;
const IER: u64 = 0x1000_0001;
const LCR: u64 = 0x1000_0003;
const LSR: u64 = 0x1000_0005;
const SCR: u64 = 0x1000_0007;

const LSR_RX_READY: u64 = 1;
const LSR_TX_EMPTY: u64 = 1 << 5;

#[test]
fn uart_lsr_always_reports_tx_empty() {
    let mut uart = Uart::new();
    assert_ne!(uart.load(LSR, 8).unwrap() & LSR_TX_EMPTY, 0);
    uart.store(THR, 8, u64::from(b'x')).unwrap();
    assert_ne!(uart.load(LSR, 8).unwrap() & LSR_TX_EMPTY, 0);
}

#[test]
fn uart_rx_ready_follows_receive_and_drain() {
    let mut uart = Uart::new();
    assert_eq!(uart.load(LSR, 8).unwrap() & LSR_RX_READY, 0);

    uart.receive_byte(b'a');
    assert_ne!(uart.load(LSR, 8).unwrap() & LSR_RX_READY, 0);

    assert_eq!(uart.load(RHR, 8).unwrap(), u64::from(b'a'));
    assert_eq!(uart.load(LSR, 8).unwrap() & LSR_RX_READY, 0, "RHR read clears data-ready");
}

#[test]
fn uart_thr_bytes_reach_output_queue_in_order() {
    let mut uart = Uart::new();
    for byte in b"ok\n" {
        uart.store(THR, 8, u64::from(*byte)).unwrap();
    }
    assert_eq!(uart.pop_output(), Some(b'o'));
    assert_eq!(uart.pop_output(), Some(b'k'));
    assert_eq!(uart.pop_output(), Some(b'\n'));
    assert_eq!(uart.pop_output(), None);
}

#[test]
fn uart_interrupt_requires_ier_rx_enable() {
    let mut uart = Uart::new();
    uart.receive_byte(b'a');
    assert!(!uart.is_interrupting(), "receive interrupt disabled by default");

    // Enabling the receive interrupt with a byte waiting asserts the line.
    uart.store(IER, 8, 1).unwrap();
    assert!(uart.is_interrupting());
}

#[test]
fn uart_interrupt_line_is_single_shot() {
    let mut uart = Uart::new();
    uart.store(IER, 8, 1).unwrap();
    uart.receive_byte(b'a');
    assert!(uart.is_interrupting());
    assert!(!uart.is_interrupting(), "observing the line clears it");

    uart.receive_byte(b'b');
    assert!(uart.is_interrupting(), "a new byte re-asserts the line");
}

#[test]
fn uart_scratch_and_lcr_round_trip() {
    let mut uart = Uart::new();
    uart.store(SCR, 8, 0x5A).unwrap();
    uart.store(LCR, 8, 0x03).unwrap();
    assert_eq!(uart.load(SCR, 8).unwrap(), 0x5A);
    assert_eq!(uart.load(LCR, 8).unwrap(), 0x03);
}

#[test]
fn uart_rejects_wide_accesses() {
    let mut uart = Uart::new();
    assert!(uart.load(RHR, 16).is_err());
    assert!(uart.load(RHR, 32).is_err());
    assert!(uart.store(THR, 32, 0).is_err());
}
