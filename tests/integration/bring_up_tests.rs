//! Board bring-up: discovery, exclusion of missing devices, register
//! configuration, LED reset, shutdown.

use std::rc::Rc;

use uio_rgb::app::events::AppEvent;
use uio_rgb::board::Board;
use uio_rgb::config::AppConfig;
use uio_rgb::drivers::color::ColorModel;
use uio_rgb::drivers::gpio::{
    GIER_ENABLE, GPIO_DATA, GPIO_GIER, GPIO_IER, GPIO_TRI, GPIO2_TRI, TRI_INPUT, TRI_OUTPUT,
};
use uio_rgb::drivers::pwm;
use uio_rgb::error::ColorError;

use crate::mock_hw::{
    HwOp, LED_ADDR, LED_SLOT, MockBus, PIR_ADDR, PIR_SLOT, RGB_ADDR, SW_BTN_ADDR, SW_BTN_SLOT, Wake,
    rig, rig_with,
};

#[test]
fn standard_board_attaches_every_device() {
    let rig = rig(vec![]);
    let board = rig.reactor.board();

    assert!(board.gpio.iter().all(|d| d.window.is_some() && d.handle.is_some()));
    assert!(board.gpio.iter().all(|d| d.armed));
    assert!(board.pwm[0].window.is_some());
    assert_eq!(board.wait_slots().collect::<Vec<_>>(), vec![SW_BTN_SLOT, PIR_SLOT]);
    assert_eq!(board.gpio[PIR_SLOT].indicator, Some(LED_SLOT));
}

#[test]
fn interrupt_registers_follow_channel_config() {
    let rig = rig(vec![]);

    assert_eq!(rig.peek(SW_BTN_ADDR, GPIO_TRI), TRI_INPUT);
    assert_eq!(rig.peek(SW_BTN_ADDR, GPIO2_TRI), TRI_INPUT);
    assert_eq!(rig.peek(SW_BTN_ADDR, GPIO_IER), 0x3);
    assert_eq!(rig.peek(SW_BTN_ADDR, GPIO_GIER), GIER_ENABLE);

    assert_eq!(rig.peek(LED_ADDR, GPIO_TRI), TRI_OUTPUT);
    assert_eq!(rig.peek(LED_ADDR, GPIO_IER), 0);
    assert_eq!(rig.peek(LED_ADDR, GPIO_GIER), 0);

    assert_eq!(rig.peek(PIR_ADDR, GPIO_IER), 0x1);
    assert_eq!(rig.peek(PIR_ADDR, GPIO_GIER), GIER_ENABLE);
}

#[test]
fn leds_start_dark_with_bank_running() {
    let rig = rig(vec![]);
    let rgb = rig.probe(RGB_ADDR).borrow();

    assert_eq!(pwm::period(&*rgb), 1_000_000);
    assert!(pwm::is_enabled(&*rgb));
    for ch in 0..6 {
        assert_eq!(pwm::duty(&*rgb, ch), 0);
    }
}

#[test]
fn leds_off_programs_period_then_duties_then_run_bit() {
    let config = AppConfig::default();
    let mut bus = MockBus::standard();
    let mut board = Board::bring_up(&config, &mut bus);
    bus.log.borrow_mut().clear();

    ColorModel::new(&config.leds).all_leds_off(&mut board.pwm);

    let writes: Vec<(usize, u32)> = bus
        .log
        .borrow()
        .iter()
        .filter_map(|op| match *op {
            HwOp::Write { addr, offset, value } if addr == RGB_ADDR => Some((offset, value)),
            _ => None,
        })
        .collect();

    assert_eq!(writes.len(), 8);
    assert_eq!(writes[0], (pwm::PWM_PERIOD, 1_000_000));
    let mut duties: Vec<usize> = writes[1..7]
        .iter()
        .map(|&(offset, value)| {
            assert_eq!(value, 0);
            offset
        })
        .collect();
    duties.sort_unstable();
    let expected: Vec<usize> = (0..6).map(|n| pwm::PWM_DUTY_BASE + 4 * n).collect();
    assert_eq!(duties, expected);
    assert_eq!(writes[7], (pwm::PWM_CTRL, pwm::PWM_RUN));
}

#[test]
fn missing_block_is_left_out_of_wait_set() {
    let mut rig = rig_with(MockBus::standard().without(PIR_ADDR), vec![]);

    assert!(rig.reactor.board().gpio[PIR_SLOT].window.is_none());
    assert!(rig.reactor.board().gpio[PIR_SLOT].location.is_none());
    assert_eq!(rig.reactor.arm(), 1);
    assert_eq!(rig.reactor.wait_set(), &[SW_BTN_SLOT]);
}

#[test]
fn unopenable_block_is_left_out_of_wait_set() {
    let mut bus = MockBus::standard();
    bus.unopenable.push(u64::from(SW_BTN_ADDR));
    let mut rig = rig_with(bus, vec![]);

    assert!(rig.reactor.board().gpio[SW_BTN_SLOT].handle.is_none());
    assert_eq!(rig.reactor.arm(), 1);
    assert_eq!(rig.reactor.wait_set(), &[PIR_SLOT]);
}

#[test]
fn failed_discovery_leaves_nothing_attached() {
    let mut bus = MockBus::standard();
    bus.fail_discovery = true;
    let mut rig = rig_with(bus, vec![]);

    let board = rig.reactor.board();
    assert!(board.gpio.iter().all(|d| d.window.is_none()));
    assert!(board.pwm.iter().all(|b| b.window.is_none()));
    assert_eq!(rig.reactor.arm(), 0);
}

#[test]
fn missing_indicator_does_not_stop_motion_handling() {
    let mut rig = rig_with(
        MockBus::standard().without(LED_ADDR),
        vec![Wake::Ready(vec![PIR_SLOT])],
    );
    let cancel = rig.cancel.clone();
    rig.poke(PIR_ADDR, GPIO_DATA, 0x1);

    rig.reactor.step(&cancel);
    assert_eq!(rig.reactor.context().inputs.motion_events, 1);
}

#[test]
fn missing_pwm_bank_rejects_palettes_but_keeps_state() {
    let mut rig = rig_with(
        MockBus::standard().without(RGB_ADDR),
        vec![Wake::Ready(vec![SW_BTN_SLOT]), Wake::Ready(vec![PIR_SLOT])],
    );
    let cancel = rig.cancel.clone();
    rig.poke(SW_BTN_ADDR, GPIO_DATA, 0x1);

    rig.reactor.step(&cancel);
    rig.reactor.step(&cancel);

    assert_eq!(rig.reactor.context().led_a.rgb.red, 34);
    for silk in [5, 6] {
        assert!(rig.events().contains(&AppEvent::PaletteRejected {
            silk,
            error: ColorError::BankUnavailable(0),
        }));
    }
}

#[test]
fn shutdown_releases_every_window() {
    let rig = rig(vec![]);
    let probes = rig.probes;

    rig.reactor.into_board().shutdown();

    for addr in [SW_BTN_ADDR, LED_ADDR, PIR_ADDR, RGB_ADDR] {
        assert_eq!(Rc::strong_count(&probes[&addr]), 1);
    }
}
