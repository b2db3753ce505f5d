//! Transition and status logging.
//!
//! On the MCU every line goes out over defmt-rtt; host builds mirror the
//! same text on stdout.

#![cfg_attr(not(target_os = "none"), allow(dead_code))]

use closure_core::controller::Action;
use closure_core::dispatch::Dispatched;
use closure_core::io::InputLevels;

use crate::clock::FirmwareInstant;
use crate::status::StatusSnapshot;

pub fn transition(dispatched: &Dispatched, at: FirmwareInstant) {
    let Dispatched {
        id,
        cause,
        transition,
    } = *dispatched;
    let rearm_ms = u64::try_from(transition.rearm.as_millis()).unwrap_or(u64::MAX);

    if transition.is_jam() {
        emit_jam(id, transition.from, at.as_millis());
    }
    emit_transition(
        id,
        transition.from.label(),
        transition.to.label(),
        cause.label(),
        rearm_ms,
        at.as_millis(),
    );
}

#[cfg(target_os = "none")]
fn emit_transition(
    id: u32,
    from: &'static str,
    to: &'static str,
    cause: &'static str,
    rearm_ms: u64,
    at_ms: u64,
) {
    defmt::info!(
        "closure:#{} {} -> {} ({}) next={}ms t={}ms",
        id,
        from,
        to,
        cause,
        rearm_ms,
        at_ms
    );
}

#[cfg(not(target_os = "none"))]
fn emit_transition(
    id: u32,
    from: &'static str,
    to: &'static str,
    cause: &'static str,
    rearm_ms: u64,
    at_ms: u64,
) {
    println!("closure:#{id} {from} -> {to} ({cause}) next={rearm_ms}ms t={at_ms}ms");
}

#[cfg(target_os = "none")]
fn emit_jam(id: u32, from: Action, at_ms: u64) {
    defmt::warn!(
        "closure:#{} outer door jammed during {}, cooling down t={}ms",
        id,
        from.label(),
        at_ms
    );
}

#[cfg(not(target_os = "none"))]
fn emit_jam(id: u32, from: Action, at_ms: u64) {
    println!(
        "closure:#{id} outer door jammed during {}, cooling down t={at_ms}ms",
        from.label()
    );
}

#[cfg(target_os = "none")]
pub fn boot(levels: InputLevels, at: FirmwareInstant) {
    defmt::info!(
        "closure: boot inner_open={} outer_closed={} sens_open={} sens_closed={} t={}ms",
        levels.sw_inner_open,
        levels.sw_outer_closed,
        levels.sens_open,
        levels.sens_closed,
        at.as_millis()
    );
}

#[cfg(not(target_os = "none"))]
pub fn boot(levels: InputLevels, at: FirmwareInstant) {
    println!(
        "closure: boot inner_open={} outer_closed={} sens_open={} sens_closed={} t={}ms",
        levels.sw_inner_open,
        levels.sw_outer_closed,
        levels.sens_open,
        levels.sens_closed,
        at.as_millis()
    );
}

#[cfg(target_os = "none")]
pub fn heartbeat(status: StatusSnapshot) {
    defmt::info!(
        "closure: {} inputs={=u8:b} transitions={} jams={}",
        status.action.label(),
        status.inputs.to_mask(),
        status.transitions,
        status.jams
    );
}

#[cfg(not(target_os = "none"))]
pub fn heartbeat(status: StatusSnapshot) {
    println!(
        "closure: {} inputs={:04b} transitions={} jams={}",
        status.action.label(),
        status.inputs.to_mask(),
        status.transitions,
        status.jams
    );
}
