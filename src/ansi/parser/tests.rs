// src/ansi/parser/tests.rs

use super::*;
use crate::ansi::commands::{Attribute, DeviceAttributesLevel, EraseMode, EscCommand};
use crate::color::{Color, Rgb};
use test_log::test;

fn parse(bytes: &[u8]) -> Vec<AnsiCommand> {
    Parser::new().feed(bytes)
}

#[test]
fn plain_text_prints() {
    assert_eq!(
        parse(b"hi"),
        vec![AnsiCommand::Print('h'), AnsiCommand::Print('i')]
    );
}

#[test]
fn utf8_multibyte_characters() {
    assert_eq!(
        parse("héλ🦀".as_bytes()),
        vec![
            AnsiCommand::Print('h'),
            AnsiCommand::Print('é'),
            AnsiCommand::Print('λ'),
            AnsiCommand::Print('🦀'),
        ]
    );
}

#[test]
fn invalid_utf8_becomes_replacement() {
    let commands = parse(&[0xFF, b'a']);
    assert!(commands.contains(&AnsiCommand::Print(char::REPLACEMENT_CHARACTER)));
    assert!(commands.contains(&AnsiCommand::Print('a')));
}

#[test]
fn c0_controls_dispatch() {
    assert_eq!(
        parse(b"\x07\x08\x09\x0a\x0d"),
        vec![
            AnsiCommand::C0(C0Control::Bell),
            AnsiCommand::C0(C0Control::Backspace),
            AnsiCommand::C0(C0Control::Tab),
            AnsiCommand::C0(C0Control::LineFeed),
            AnsiCommand::C0(C0Control::CarriageReturn),
        ]
    );
}

#[test]
fn cursor_movement_sequences() {
    assert_eq!(
        parse(b"\x1b[A\x1b[3B\x1b[2;5H"),
        vec![
            AnsiCommand::Csi(CsiCommand::CursorUp(1)),
            AnsiCommand::Csi(CsiCommand::CursorDown(3)),
            AnsiCommand::Csi(CsiCommand::CursorPosition { row: 2, col: 5 }),
        ]
    );
}

#[test]
fn missing_parameters_default() {
    assert_eq!(
        parse(b"\x1b[;5H"),
        vec![AnsiCommand::Csi(CsiCommand::CursorPosition { row: 1, col: 5 })]
    );
    assert_eq!(
        parse(b"\x1b[K"),
        vec![AnsiCommand::Csi(CsiCommand::EraseInLine(EraseMode::ToEnd))]
    );
}

#[test]
fn sgr_with_extended_colors() {
    assert_eq!(
        parse(b"\x1b[1;38;5;196;48;2;1;2;3m"),
        vec![AnsiCommand::Csi(CsiCommand::SetGraphicsRendition(vec![
            Attribute::Bold,
            Attribute::Foreground(Color::Indexed(196)),
            Attribute::Background(Color::Rgb(Rgb(1, 2, 3))),
        ]))]
    );
}

#[test]
fn dec_private_modes_fan_out() {
    assert_eq!(
        parse(b"\x1b[?1049;25h\x1b[?1l"),
        vec![
            AnsiCommand::Csi(CsiCommand::SetModePrivate(1049)),
            AnsiCommand::Csi(CsiCommand::SetModePrivate(25)),
            AnsiCommand::Csi(CsiCommand::ResetModePrivate(1)),
        ]
    );
}

#[test]
fn esc_save_restore_and_index() {
    assert_eq!(
        parse(b"\x1b7\x1b8\x1bM"),
        vec![
            AnsiCommand::Esc(EscCommand::SaveCursor),
            AnsiCommand::Esc(EscCommand::RestoreCursor),
            AnsiCommand::Esc(EscCommand::ReverseIndex),
        ]
    );
}

#[test]
fn osc_title_with_bel_and_st() {
    assert_eq!(
        parse(b"\x1b]2;hello\x07"),
        vec![AnsiCommand::Osc(OscCommand::SetWindowTitle("hello".into()))]
    );
    assert_eq!(
        parse(b"\x1b]0;abc\x1b\\"),
        vec![AnsiCommand::Osc(OscCommand::SetIconAndWindowTitle(
            "abc".into()
        ))]
    );
}

#[test]
fn osc_aborted_by_new_sequence() {
    // ESC inside an OSC that is not ST drops the payload and starts over.
    assert_eq!(
        parse(b"\x1b]2;junk\x1b[A"),
        vec![AnsiCommand::Csi(CsiCommand::CursorUp(1))]
    );
}

#[test]
fn device_attribute_queries() {
    assert_eq!(
        parse(b"\x1b[c\x1b[>c"),
        vec![
            AnsiCommand::Csi(CsiCommand::DeviceAttributes(DeviceAttributesLevel::Primary)),
            AnsiCommand::Csi(CsiCommand::DeviceAttributes(
                DeviceAttributesLevel::Secondary
            )),
        ]
    );
}

#[test]
fn c0_executes_inside_csi_collection() {
    // The LF runs immediately; the surrounding CSI still completes.
    assert_eq!(
        parse(b"\x1b[2\x0aA"),
        vec![
            AnsiCommand::C0(C0Control::LineFeed),
            AnsiCommand::Csi(CsiCommand::CursorUp(2)),
        ]
    );
}

#[test]
fn esc_aborting_csi_discards_collected_params() {
    // The half-collected "12" must not prefix the new sequence's "3".
    assert_eq!(
        parse(b"\x1b[12\x1b[3m"),
        vec![AnsiCommand::Csi(CsiCommand::SetGraphicsRendition(vec![
            Attribute::Italic
        ]))]
    );
    // Same for a private marker left behind by an aborted sequence.
    assert_eq!(
        parse(b"\x1b[?10\x1b[4h"),
        vec![AnsiCommand::Csi(CsiCommand::SetMode(4))]
    );
}

#[test]
fn cancel_aborts_sequence() {
    assert_eq!(
        parse(b"\x1b[12\x18x"),
        vec![AnsiCommand::Print('x')]
    );
}

#[test]
fn unknown_sequences_resynchronize() {
    // An unsupported final byte yields an Unsupported command, and the
    // next printable decodes normally.
    let commands = parse(b"\x1b[5q ok");
    assert!(matches!(
        commands[0],
        AnsiCommand::Csi(CsiCommand::Unsupported { final_byte: b'q', .. })
    ));
    assert_eq!(commands[1], AnsiCommand::Print(' '));
    assert_eq!(commands[2], AnsiCommand::Print('o'));
}

#[test]
fn charset_designation_is_discarded() {
    assert_eq!(parse(b"\x1b(Bx"), vec![AnsiCommand::Print('x')]);
}

#[test]
fn dcs_string_is_consumed_silently() {
    assert_eq!(parse(b"\x1bPsome junk\x1b\\y"), vec![AnsiCommand::Print('y')]);
}

#[test]
fn excess_parameters_are_dropped() {
    let commands = parse(b"\x1b[1;2;3;4;5;6;7;8;9;10;11;12;13;14;15;16;17;18;19;20m");
    // Still exactly one SGR command; the tail beyond the cap is gone.
    assert_eq!(commands.len(), 1);
    match &commands[0] {
        AnsiCommand::Csi(CsiCommand::SetGraphicsRendition(attrs)) => {
            assert!(attrs.len() <= crate::ansi::MAX_CSI_PARAMS);
        }
        other => panic!("unexpected command: {:?}", other),
    }
}

#[test]
fn chunking_invariance_across_every_split_point() {
    let input: &[u8] =
        b"A\x1b[31;1mB\xc3\xa9\x1b]2;ti\x1b\\\x1b[?25l\x1b[2J\x1b[10;20HC\x0d\x0a\x1b[0m";
    let expected = parse(input);
    for split in 0..=input.len() {
        let mut parser = Parser::new();
        let mut commands = parser.feed(&input[..split]);
        commands.extend(parser.feed(&input[split..]));
        assert_eq!(commands, expected, "split at byte {}", split);
    }
}

#[test]
fn chunking_invariance_byte_at_a_time() {
    let input: &[u8] = b"x\x1b[38;2;9;8;7mY\x1b]0;t\x07\x1b[5;5f";
    let expected = parse(input);
    let mut parser = Parser::new();
    let mut commands = Vec::new();
    for &byte in input {
        commands.extend(parser.feed(&[byte]));
    }
    assert_eq!(commands, expected);
}
