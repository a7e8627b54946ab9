use anyhow::{bail, ensure, Context, Result};
use log::{info, warn};
use ps2host_common::WireFrame;
use ps2host_sim::{sim_host_config, DeviceBehavior, DeviceConfig, RxEvent, Testbench};

/// Upper bound for a single frame exchange, in simulated ticks.
const FRAME_TICKS: u64 = 10_000;

pub enum Scenario {
    /// Random bytes to an echoing device and back.
    Echo { count: usize },
    Send(u8),
    Type(String),
    Stall,
}

/// What the `stall` scenario observed.
#[derive(Debug)]
pub struct StallReport {
    pub watchdog_tick: u64,
    pub recovered: RxEvent,
}

pub fn run(scenario: Scenario) -> Result<()> {
    match scenario {
        Scenario::Echo { count } => {
            let bytes = run_echo(count)?;
            println!("{} bytes echoed without error", bytes.len());
        }
        Scenario::Send(byte) => {
            let frame = run_send(byte)?;
            println!("device received {:#04x} {:?}", frame.byte(), frame);
        }
        Scenario::Type(text) => {
            let events = run_type(&text)?;
            let received: String = events.iter().map(|e| e.byte as char).collect();
            println!("host received {:?}", received);
        }
        Scenario::Stall => {
            let report = run_stall()?;
            println!(
                "watchdog recovered the bus at tick {}, then received {:#04x} at tick {}",
                report.watchdog_tick, report.recovered.byte, report.recovered.tick
            );
        }
    }
    Ok(())
}

fn bench(behavior: DeviceBehavior) -> Result<Testbench> {
    Testbench::new(
        &sim_host_config(),
        DeviceConfig::builder().behavior(behavior).build(),
    )
}

/// Send `count` random bytes and check each one comes back intact.
pub fn run_echo(count: usize) -> Result<Vec<u8>> {
    let mut bench = bench(DeviceBehavior::Echo)?;
    let mut echoed = Vec::with_capacity(count);
    for i in 0..count {
        let byte = rand::random::<u8>();
        bench
            .transmit(byte, FRAME_TICKS)
            .with_context(|| format!("sending byte {} of {}", i + 1, count))?;
        let event = bench
            .receive(FRAME_TICKS)
            .with_context(|| format!("waiting for echo of {:#04x}", byte))?;
        ensure!(
            !event.error,
            "echo of {:#04x} arrived with {:?}",
            byte,
            event.fault
        );
        ensure!(
            event.byte == byte,
            "sent {:#04x}, got {:#04x} back",
            byte,
            event.byte
        );
        info!("echo {:#04x} ok at tick {}", byte, event.tick);
        echoed.push(event.byte);
    }
    ensure!(
        bench.ready_while_busy() == 0,
        "ready pulsed while the host was sending"
    );
    Ok(echoed)
}

/// Send one byte to a quiet device and return the frame it clocked in.
pub fn run_send(byte: u8) -> Result<WireFrame> {
    let mut bench = bench(DeviceBehavior::Quiet)?;
    let ticks = bench.transmit(byte, FRAME_TICKS)?;
    info!("{:#04x} shifted out in {} ticks", byte, ticks);
    // The device finishes its acknowledge pulse before it records the frame.
    bench.run_until(FRAME_TICKS, |b| b.device.is_idle())?;
    let Some(frame) = bench.device.take_received().pop() else {
        bail!("device did not record a frame for {:#04x}", byte);
    };
    ensure!(frame.is_valid(), "device received malformed {:?}", frame);
    Ok(frame)
}

/// Have the device type `text` and return the host's receive log.
pub fn run_type(text: &str) -> Result<Vec<RxEvent>> {
    let mut bench = bench(DeviceBehavior::Quiet)?;
    for byte in text.bytes() {
        bench.device.queue_byte(byte);
    }
    let mut events = Vec::new();
    for byte in text.bytes() {
        let event = bench
            .receive(FRAME_TICKS)
            .with_context(|| format!("waiting for {:#04x}", byte))?;
        if event.error {
            warn!("{:#04x} received with {:?}", event.byte, event.fault);
        }
        events.push(event);
    }
    let faulty = events.iter().filter(|e| e.error).count();
    ensure!(faulty == 0, "{} of {} bytes had frame errors", faulty, events.len());
    Ok(events)
}

/// Stall the device mid-frame, wait for the watchdog, then check the next
/// frame decodes cleanly.
pub fn run_stall() -> Result<StallReport> {
    let mut bench = bench(DeviceBehavior::Quiet)?;
    let timeout = u64::from(bench.host.timing().watchdog_ticks);

    bench.device.queue_frame(WireFrame::new(b'?').truncated(5));
    bench.run_until(FRAME_TICKS, |b| b.watchdog_resets() > 0)?;
    let watchdog_tick = bench.tick();
    warn!("device stalled; watchdog fired at tick {}", watchdog_tick);
    ensure!(
        bench.rx_events().is_empty(),
        "partial frame reached the register interface"
    );

    bench.device.queue_byte(b'K');
    let recovered = bench.receive(FRAME_TICKS + timeout)?;
    ensure!(
        !recovered.error && recovered.byte == b'K',
        "unexpected frame after recovery: {:?}",
        recovered
    );
    info!("recovered, {:#04x} at tick {}", recovered.byte, recovered.tick);
    Ok(StallReport {
        watchdog_tick,
        recovered,
    })
}

/// Parse a byte written as hex, with or without a `0x` prefix.
pub fn parse_byte(text: &str) -> Result<u8> {
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    u8::from_str_radix(digits, 16).with_context(|| format!("'{}' is not a hex byte", text))
}
