//! Reactive handler behaviour, driven through the event loop.
//!
//! Inputs are poked straight into the mock register memory, then a
//! scripted wake hands the owning slot to the loop.

use uio_rgb::app::events::AppEvent;
use uio_rgb::app::service::Step;
use uio_rgb::drivers::color::{RgbPalette, duty_clocks, palette_percent};
use uio_rgb::drivers::gpio::{GPIO_DATA, GPIO_ISR, GPIO2_DATA};
use uio_rgb::drivers::pwm;

use crate::mock_hw::{
    HwOp, LED_ADDR, LED_SLOT, LED_TOKEN, PIR_ADDR, PIR_SLOT, PIR_TOKEN, RGB_ADDR, SW_BTN_ADDR,
    SW_BTN_SLOT, Wake, rig,
};

fn palette_applied(events: &[AppEvent]) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, AppEvent::PaletteApplied { .. }))
        .count()
}

#[test]
fn motion_with_idle_inputs_only_toggles_indicator() {
    let mut rig = rig(vec![Wake::Ready(vec![PIR_SLOT])]);
    let cancel = rig.cancel.clone();
    rig.poke(PIR_ADDR, GPIO_DATA, 0x1);

    assert_eq!(rig.reactor.step(&cancel), Step::Serviced(1));

    let ctx = rig.reactor.context();
    assert_eq!(ctx.inputs.motion_events, 1);
    assert_eq!(ctx.led_a.rgb, RgbPalette::uniform(2));
    assert_eq!(ctx.led_b.rgb, RgbPalette::uniform(2));
    assert_eq!(rig.peek(LED_ADDR, GPIO_DATA), 0xC);
    assert_eq!(rig.events(), &[AppEvent::Motion { value: 0x1, count: 1 }]);

    let rgb = rig.probe(RGB_ADDR).borrow();
    for ch in 0..6 {
        assert_eq!(pwm::duty(&*rgb, ch), 0);
    }
}

#[test]
fn buttons_then_switch_then_motion_warms_led_a() {
    let mut rig = rig(vec![
        Wake::Ready(vec![SW_BTN_SLOT]),
        Wake::Ready(vec![SW_BTN_SLOT]),
        Wake::Ready(vec![PIR_SLOT]),
    ]);
    let cancel = rig.cancel.clone();

    rig.poke(SW_BTN_ADDR, GPIO2_DATA, 0x1);
    rig.reactor.step(&cancel);
    rig.poke(SW_BTN_ADDR, GPIO_DATA, 0x1);
    rig.reactor.step(&cancel);
    rig.reactor.step(&cancel);

    let ctx = rig.reactor.context();
    assert_eq!(ctx.led_a.rgb, RgbPalette::new(34, 2, 2));
    assert_eq!(ctx.led_b.rgb, RgbPalette::new(2, 2, 0));
    assert_eq!(ctx.inputs.button_events, 1);
    assert_eq!(ctx.inputs.switch_events, 1);

    // Buttons 0x2, switches 0x1, motion 0xC.
    assert_eq!(rig.peek(LED_ADDR, GPIO_DATA), 0xF);

    let rgb = rig.probe(RGB_ADDR).borrow();
    let neutral = duty_clocks(palette_percent(2), 500_000);
    // LED5: r=ch2 g=ch1 b=ch0, LED6: r=ch5 g=ch4 b=ch3.
    assert_eq!(pwm::duty(&*rgb, 2), duty_clocks(palette_percent(34), 500_000));
    assert_eq!(pwm::duty(&*rgb, 2), 66_500);
    assert_eq!(pwm::duty(&*rgb, 1), neutral);
    assert_eq!(pwm::duty(&*rgb, 0), neutral);
    assert_eq!(pwm::duty(&*rgb, 5), neutral);
    assert_eq!(pwm::duty(&*rgb, 4), neutral);
    assert_eq!(pwm::duty(&*rgb, 3), 0);
    drop(rgb);

    assert!(rig.events().contains(&AppEvent::PaletteApplied {
        silk: 5,
        palette: RgbPalette::new(34, 2, 2),
    }));
    assert!(rig.events().contains(&AppEvent::PaletteApplied {
        silk: 6,
        palette: RgbPalette::new(2, 2, 0),
    }));
}

#[test]
fn repeated_identical_switch_word_counts_once() {
    let mut rig = rig(vec![
        Wake::Ready(vec![SW_BTN_SLOT]),
        Wake::Ready(vec![SW_BTN_SLOT]),
        Wake::Ready(vec![SW_BTN_SLOT]),
    ]);
    let cancel = rig.cancel.clone();
    rig.poke(SW_BTN_ADDR, GPIO_DATA, 0x4);

    for _ in 0..3 {
        rig.reactor.step(&cancel);
    }

    assert_eq!(rig.reactor.context().inputs.switch_events, 1);
    assert_eq!(rig.reactor.context().inputs.switches, 0x4);
    assert_eq!(rig.peek(LED_ADDR, GPIO_DATA), 0x1);
    assert_eq!(
        rig.events(),
        &[AppEvent::SwitchesChanged { value: 0x4, count: 1 }]
    );
}

#[test]
fn switch_and_button_words_debounce_independently() {
    let mut rig = rig(vec![
        Wake::Ready(vec![SW_BTN_SLOT]),
        Wake::Ready(vec![SW_BTN_SLOT]),
    ]);
    let cancel = rig.cancel.clone();

    rig.poke(SW_BTN_ADDR, GPIO2_DATA, 0x8);
    rig.reactor.step(&cancel);
    assert_eq!(rig.peek(LED_ADDR, GPIO_DATA), 0x2);

    rig.poke(SW_BTN_ADDR, GPIO2_DATA, 0x0);
    rig.poke(SW_BTN_ADDR, GPIO_DATA, 0x2);
    rig.reactor.step(&cancel);

    let inputs = rig.reactor.context().inputs;
    assert_eq!(inputs.button_events, 2);
    assert_eq!(inputs.switch_events, 1);
    // 0x2 toggled twice, 0x1 once.
    assert_eq!(rig.peek(LED_ADDR, GPIO_DATA), 0x1);
}

#[test]
fn dim_rule_tracks_led_a_blue() {
    let mut rig = rig(vec![
        Wake::Ready(vec![SW_BTN_SLOT]),
        Wake::Ready(vec![PIR_SLOT]),
        Wake::Ready(vec![PIR_SLOT]),
    ]);
    let cancel = rig.cancel.clone();
    rig.poke(SW_BTN_ADDR, GPIO_DATA, 0x8);

    rig.reactor.step(&cancel);
    rig.reactor.step(&cancel);
    assert_eq!(rig.reactor.context().led_a.rgb, RgbPalette::new(1, 1, 6));
    assert_eq!(rig.reactor.context().led_b.rgb, RgbPalette::new(1, 1, 10));

    rig.reactor.step(&cancel);
    assert_eq!(rig.reactor.context().led_a.rgb, RgbPalette::new(1, 1, 10));
    assert_eq!(rig.reactor.context().led_b.rgb, RgbPalette::new(1, 1, 14));
}

#[test]
fn saturated_palettes_stop_being_pushed() {
    let mut script = vec![Wake::Ready(vec![SW_BTN_SLOT])];
    script.extend((0..10).map(|_| Wake::Ready(vec![PIR_SLOT])));
    let mut rig = rig(script);
    let cancel = rig.cancel.clone();
    rig.poke(SW_BTN_ADDR, GPIO_DATA, 0x1);

    for _ in 0..11 {
        rig.reactor.step(&cancel);
    }

    let ctx = rig.reactor.context();
    assert_eq!(ctx.led_a.rgb.red, 255);
    assert_eq!(ctx.led_b.rgb.blue, 0);
    assert_eq!(ctx.inputs.motion_events, 10);
    // A.red reaches 255 on the eighth motion; the last two change nothing.
    assert_eq!(palette_applied(rig.events()), 16);
}

#[test]
fn held_button_resets_palettes_and_pushes_once() {
    let mut rig = rig(vec![
        Wake::Ready(vec![SW_BTN_SLOT]),
        Wake::Ready(vec![PIR_SLOT]),
        Wake::Ready(vec![SW_BTN_SLOT]),
        Wake::Ready(vec![PIR_SLOT]),
        Wake::Ready(vec![PIR_SLOT]),
    ]);
    let cancel = rig.cancel.clone();

    rig.poke(SW_BTN_ADDR, GPIO_DATA, 0x1);
    rig.reactor.step(&cancel);
    rig.reactor.step(&cancel);
    assert_eq!(rig.reactor.context().led_a.rgb, RgbPalette::new(34, 2, 2));
    assert_eq!(palette_applied(rig.events()), 2);

    rig.poke(SW_BTN_ADDR, GPIO_DATA, 0x0);
    rig.poke(SW_BTN_ADDR, GPIO2_DATA, 0x1);
    rig.reactor.step(&cancel);
    rig.reactor.step(&cancel);

    let ctx = rig.reactor.context();
    assert_eq!(ctx.led_a.rgb, RgbPalette::uniform(2));
    assert_eq!(ctx.led_b.rgb, RgbPalette::uniform(2));
    assert_eq!(palette_applied(rig.events()), 4);
    for silk in [5, 6] {
        assert!(rig.events().contains(&AppEvent::PaletteApplied {
            silk,
            palette: RgbPalette::uniform(2),
        }));
    }
    {
        let rgb = rig.probe(RGB_ADDR).borrow();
        let neutral = duty_clocks(palette_percent(2), 500_000);
        for ch in 0..6 {
            assert_eq!(pwm::duty(&*rgb, ch), neutral);
        }
    }

    // Already neutral: the next motion changes nothing and pushes nothing.
    rig.reactor.step(&cancel);
    assert_eq!(palette_applied(rig.events()), 4);
}

#[test]
fn motion_rearms_in_protocol_order() {
    let mut rig = rig(vec![Wake::Ready(vec![PIR_SLOT])]);
    let cancel = rig.cancel.clone();
    rig.poke(PIR_ADDR, GPIO_ISR, 0x1);

    rig.reactor.step(&cancel);

    assert_eq!(
        rig.ops(),
        vec![
            HwOp::Drain { token: PIR_TOKEN },
            HwOp::Read { addr: PIR_ADDR, offset: GPIO_DATA },
            HwOp::Read { addr: PIR_ADDR, offset: GPIO_ISR },
            HwOp::Write { addr: PIR_ADDR, offset: GPIO_ISR, value: 0x1 },
            HwOp::Control { token: PIR_TOKEN, word: [1, 0, 0, 0] },
            HwOp::Read { addr: LED_ADDR, offset: GPIO_DATA },
            HwOp::Write { addr: LED_ADDR, offset: GPIO_DATA, value: 0xC },
        ]
    );
}

#[test]
fn inputs_are_sampled_before_rearm() {
    let mut rig = rig(vec![Wake::Ready(vec![SW_BTN_SLOT])]);
    let cancel = rig.cancel.clone();

    rig.reactor.step(&cancel);

    let ops = rig.ops();
    let pos = |op: HwOp| ops.iter().position(|o| *o == op).unwrap();
    let data = pos(HwOp::Read { addr: SW_BTN_ADDR, offset: GPIO_DATA });
    let data2 = pos(HwOp::Read { addr: SW_BTN_ADDR, offset: GPIO2_DATA });
    let isr = pos(HwOp::Read { addr: SW_BTN_ADDR, offset: GPIO_ISR });
    assert!(data < isr && data2 < isr);
}

#[test]
fn dispatch_to_indicator_is_ignored() {
    let mut rig = rig(vec![Wake::Ready(vec![LED_SLOT])]);
    let cancel = rig.cancel.clone();

    assert_eq!(rig.reactor.step(&cancel), Step::Serviced(1));
    assert_eq!(rig.ops(), vec![HwOp::Drain { token: LED_TOKEN }]);
    assert!(rig.events().is_empty());
    assert_eq!(rig.reactor.context().inputs.motion_events, 0);
}
