use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tempfile::NamedTempFile;

use macro_key_runner::test_support::{wait_for_calls, InjectedCall, MockInjector};
use macro_key_runner::{
    parse_duration, parse_hotkey_spec, Action, ActionStep, Callback, ClickKind, Command,
    InputEvent, InputListener, KeyInfo, KeyboardCommand, MacroError, MacroFile, Manager,
    MouseCommand, MouseInfo, ScriptCommand, HISTORY_LIMIT,
};

fn manager_with_mock() -> (Manager, MockInjector) {
    let mock = MockInjector::new();
    let manager = Manager::new(Arc::new(mock.clone()));
    (manager, mock)
}

// Hotkey parsing

#[test]
fn test_parse_ctrl_alt_f() {
    let chords = parse_hotkey_spec("ctrl+alt+f").unwrap();
    assert_eq!(chords.len(), 1);
    assert_eq!(chords[0].key, "f");
    assert_eq!(chords[0].ctrl, Some(true));
    assert_eq!(chords[0].alt, Some(true));
}

#[test]
fn test_duplicate_modifier_is_configuration_error() {
    let err = parse_hotkey_spec("ctrl+ctrl+f").unwrap_err();
    assert!(matches!(err, MacroError::InvalidHotkey { .. }));
}

#[test]
fn test_register_duplicate_modifier_fails() {
    let (manager, _mock) = manager_with_mock();
    let action = Action::keyboard(vec![KeyInfo::new("f")]).unwrap();
    let command = Command::Keyboard(KeyboardCommand::new(action).unwrap());
    assert!(manager.register("ctrl+ctrl+f", command).is_err());
}

// Action sequencing

#[test]
fn test_empty_action_is_configuration_error() {
    let err = Action::new(Vec::new(), Vec::new()).unwrap_err();
    assert!(matches!(err, MacroError::EmptyAction(_)));
}

#[test]
fn test_repeat_amount_emits_n_plus_one_blocks() {
    let action = Action::mouse(vec![MouseInfo::click(ClickKind::Left)])
        .unwrap()
        .repeat_amount(2);
    let clicks = action
        .steps()
        .filter(|s| matches!(s, ActionStep::Mouse(_)))
        .count();
    assert_eq!(clicks, 3);
}

#[test]
fn test_toggled_action_is_unbounded() {
    let action = Action::keyboard(vec![KeyInfo::new("w")])
        .unwrap()
        .continuous();
    assert_eq!(action.steps().take(10_000).count(), 10_000);
}

// Scenario: alt+1 clicks three times (one initial + two repeats).

#[tokio::test(start_paused = true)]
async fn test_alt_1_clicks_three_times() {
    let (manager, mock) = manager_with_mock();

    let action = Action::mouse(vec![MouseInfo::click(ClickKind::Left)])
        .unwrap()
        .start_delay(Duration::from_secs(1))
        .repeat_amount(2);
    manager
        .register("alt+1", Command::Mouse(MouseCommand::new(action).unwrap()))
        .unwrap();

    manager.on_press("alt", true);
    manager.on_press("1", false);

    assert!(wait_for_calls(&mock, 3, 30_000).await);
    assert_eq!(
        mock.calls(),
        vec![
            InjectedCall::MouseClick(ClickKind::Left, None),
            InjectedCall::MouseClick(ClickKind::Left, None),
            InjectedCall::MouseClick(ClickKind::Left, None),
        ]
    );
}

// Scenario: alt+f holds the key f for ten seconds.

#[tokio::test(start_paused = true)]
async fn test_alt_f_holds_key_for_ten_seconds() {
    let (manager, mock) = manager_with_mock();

    let action =
        Action::keyboard(vec![KeyInfo::new("f").hold(Duration::from_secs(10))]).unwrap();
    manager
        .register(
            "alt+f",
            Command::Keyboard(KeyboardCommand::new(action).unwrap()),
        )
        .unwrap();

    manager.on_press("alt", true);
    manager.on_press("f", false);

    assert!(wait_for_calls(&mock, 2, 60_000).await);
    assert_eq!(
        mock.calls(),
        vec![
            InjectedCall::KeyDown("f".to_string()),
            InjectedCall::KeyUp("f".to_string()),
        ]
    );
}

// Scenario: the engine's own output is suppressed and cannot re-trigger.

#[tokio::test(start_paused = true)]
async fn test_synthetic_echo_consumes_credits_and_does_not_retrigger() {
    let (manager, mock) = manager_with_mock();

    // "alt+e" types "e" — which would itself match the hotkey's key if the
    // echo were treated as genuine input.
    let action = Action::keyboard(vec![KeyInfo::new("e")]).unwrap();
    manager
        .register(
            "e",
            Command::Keyboard(KeyboardCommand::new(action).unwrap()),
        )
        .unwrap();

    manager.on_press("e", false);
    assert!(wait_for_calls(&mock, 1, 30_000).await);

    // One synthetic press + release are pending now.
    assert_eq!(manager.pending_suppression(), (1, 1));

    // The echo arrives: consumed, no new dispatch.
    manager.on_press("e", false);
    manager.on_release("e", false);
    tokio::task::yield_now().await;
    assert_eq!(manager.pending_suppression(), (0, 0));

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(mock.call_count(), 1, "echo must not re-trigger the macro");

    // A further press is genuine input again and fires normally.
    manager.on_press("e", false);
    assert!(wait_for_calls(&mock, 2, 30_000).await);
}

// Scenario: alt+q script command ends run().

#[tokio::test(flavor = "multi_thread")]
async fn test_script_exit_ends_run() {
    let (manager, _mock) = manager_with_mock();

    let exit_manager = manager.clone();
    let script = ScriptCommand::new(vec![Callback::sync(move || exit_manager.request_exit())]);
    manager.register("alt+q", Command::Script(script)).unwrap();

    struct Scripted(Vec<InputEvent>);
    impl InputListener for Scripted {
        fn run(&mut self, events: macro_key_runner::EventSender) -> Result<()> {
            for event in self.0.drain(..) {
                events.send(event)?;
            }
            Ok(())
        }
    }

    let listener = Scripted(vec![
        InputEvent::Press {
            key: "alt".to_string(),
            named: true,
        },
        InputEvent::Press {
            key: "q".to_string(),
            named: false,
        },
        InputEvent::Release {
            key: "q".to_string(),
            named: false,
        },
        InputEvent::Release {
            key: "alt".to_string(),
            named: true,
        },
    ]);

    let outcome = tokio::time::timeout(Duration::from_secs(5), manager.run(listener)).await;
    assert!(outcome.is_ok(), "run() must return once the exit flag is set");
    outcome.unwrap().unwrap();
    assert!(manager.exit_requested());
}

// History window

#[tokio::test]
async fn test_history_window_limits_matching() {
    let (manager, mock) = manager_with_mock();

    // A sequence of HISTORY_LIMIT identical chords still fits the window.
    let spec = vec!["z"; HISTORY_LIMIT].join(",");
    let action = Action::mouse(vec![MouseInfo::click(ClickKind::Right)]).unwrap();
    manager
        .register(&spec, Command::Mouse(MouseCommand::new(action).unwrap()))
        .unwrap();

    for _ in 0..HISTORY_LIMIT - 1 {
        manager.on_press("z", false);
    }
    tokio::task::yield_now().await;
    assert!(mock.calls().is_empty(), "19 presses must not fire a 20-chord hotkey");

    manager.on_press("z", false);
    assert!(wait_for_calls(&mock, 1, 5_000).await);
}

// Definitions file

#[test]
fn test_macro_file_round_trip() -> Result<()> {
    let temp_dir = tempfile::tempdir()?;
    let path = temp_dir.path().join("macros.json");

    let json = r#"
    {
        "macros": [
            {
                "hotkey": "alt+1",
                "action": {
                    "type": "mouse",
                    "clicks": [{"kind": "left"}],
                    "start_delay": "1s",
                    "repeat_amount": 2
                }
            },
            {"hotkey": "alt+q", "action": {"type": "exit"}}
        ]
    }
    "#;
    let original: MacroFile = serde_json::from_str(json)?;
    original.save_to_file(&path)?;

    let loaded = MacroFile::from_file(&path)?;
    assert_eq!(loaded.macros.len(), original.macros.len());
    assert_eq!(loaded.macros[0].hotkey, "alt+1");
    assert!(loaded.validate().is_ok());
    Ok(())
}

#[tokio::test]
async fn test_macro_file_apply_registers_everything() -> Result<()> {
    let mut temp_file = NamedTempFile::new()?;
    let json = r#"
    {
        "macros": [
            {
                "hotkey": "alt+e",
                "action": {
                    "type": "keyboard",
                    "keys": [{"key": "e"}],
                    "repeat_amount": 19
                }
            },
            {"hotkey": "alt+q", "action": {"type": "exit", "start_delay": "0ms"}}
        ]
    }
    "#;
    temp_file.write_all(json.as_bytes())?;

    let (manager, _mock) = manager_with_mock();
    let file = MacroFile::from_file(temp_file.path())?;
    file.apply(&manager)?;
    assert_eq!(manager.command_count(), 2);
    Ok(())
}

#[tokio::test]
async fn test_macro_file_exit_macro_sets_flag() -> Result<()> {
    let json = r#"{"macros": [{"hotkey": "alt+q", "action": {"type": "exit"}}]}"#;
    let file: MacroFile = serde_json::from_str(json)?;

    let (manager, _mock) = manager_with_mock();
    file.apply(&manager)?;

    manager.on_press("alt", true);
    manager.on_press("q", false);

    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while !manager.exit_requested() && tokio::time::Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    assert!(manager.exit_requested());
    Ok(())
}

#[tokio::test]
async fn test_macro_file_apply_rejects_bad_hotkey() {
    let json = r#"
    {
        "macros": [
            {
                "hotkey": "ctrl+ctrl+f",
                "action": {"type": "keyboard", "keys": [{"key": "f"}]}
            }
        ]
    }
    "#;
    let file: MacroFile = serde_json::from_str(json).unwrap();
    let (manager, _mock) = manager_with_mock();
    assert!(file.apply(&manager).is_err());
    assert_eq!(manager.command_count(), 0);
}

// Duration parsing edge cases

#[test]
fn test_duration_parsing_edge_cases() {
    assert_eq!(parse_duration("0ms").unwrap(), Duration::from_millis(0));
    assert_eq!(parse_duration("1000").unwrap(), Duration::from_millis(1000));
    assert_eq!(parse_duration("5S").unwrap(), Duration::from_secs(5)); // Case insensitive
    assert_eq!(parse_duration(" 2m ").unwrap(), Duration::from_secs(120)); // Whitespace

    assert!(parse_duration("").is_err());
    assert!(parse_duration("abc").is_err());
    assert!(parse_duration("1000x").is_err());
    assert!(parse_duration("-1000ms").is_err());
}

// Concurrency: two holds from different commands never interleave brackets.

#[tokio::test(start_paused = true)]
async fn test_concurrent_holds_keep_their_brackets() {
    let (manager, mock) = manager_with_mock();

    let hold_f = Action::keyboard(vec![KeyInfo::new("f")
        .ctrl(true)
        .hold(Duration::from_millis(500))])
    .unwrap();
    let hold_g = Action::keyboard(vec![KeyInfo::new("g")
        .shift(true)
        .hold(Duration::from_millis(500))])
    .unwrap();
    manager
        .register(
            "alt+1",
            Command::Keyboard(KeyboardCommand::new(hold_f).unwrap()),
        )
        .unwrap();
    manager
        .register(
            "alt+1",
            Command::Keyboard(KeyboardCommand::new(hold_g).unwrap()),
        )
        .unwrap();

    // Both commands match the same press and run concurrently.
    manager.on_press("alt", true);
    manager.on_press("1", false);

    assert!(wait_for_calls(&mock, 8, 60_000).await);
    let calls = mock.calls();

    // Whichever ran first, each bracket's four calls must be contiguous.
    let first_four = &calls[0..4];
    let second_four = &calls[4..8];
    for bracket in [first_four, second_four] {
        match &bracket[0] {
            InjectedCall::KeyDown(modifier) => {
                let key = match modifier.as_str() {
                    "ctrl" => "f",
                    "shift" => "g",
                    other => panic!("unexpected first key-down '{other}'"),
                };
                assert_eq!(bracket[1], InjectedCall::KeyDown(key.to_string()));
                assert_eq!(bracket[2], InjectedCall::KeyUp(key.to_string()));
                assert_eq!(bracket[3], InjectedCall::KeyUp(modifier.clone()));
            }
            other => panic!("bracket must start with a modifier key-down, got {other:?}"),
        }
    }
}
