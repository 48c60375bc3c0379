use proptest::prelude::*;
use relman_chat::{parse_command, ChatCommandSource, ChatConfig, ChatMessage};
use relman_core::{Command, CommandOutcome, ErrorKind};
use relman_test_utils::{track, vc, Harness};

const CHANNEL: &str = "C-RELEASES";

fn source() -> ChatCommandSource {
    ChatCommandSource::new(ChatConfig::new(CHANNEL, "U-BOT").with_privileged_users("^U-LEAD$"))
        .unwrap()
}

/// Run one chat line; input errors come back as their operator message
async fn say(harness: &Harness, user: &str, text: &str) -> Result<CommandOutcome, String> {
    let message = ChatMessage::new(CHANNEL, format!("<@U-BOT> {text}")).from_user(user);
    let request = source()
        .accept(&message)
        .expect("addressed message")
        .map_err(|error| error.user_message())?;
    Ok(harness.orchestrator.handle(request).await)
}

#[tokio::test]
async fn chat_promotion_flow() {
    let harness = Harness::new(vec![track("internal", &[5]), track("beta", &[])]);

    let outcome = say(&harness, "U-DEV", "promote wallet 5 to beta").await.unwrap();
    assert!(outcome.is_success());
    assert_eq!(harness.codes("beta"), vec![vc(5)]);

    let outcome = say(&harness, "U-DEV", "rollout wallet 5 to 10%").await.unwrap();
    assert_eq!(outcome.error_kind(), Some(ErrorKind::Permission));

    let outcome = say(&harness, "U-LEAD", "rollout wallet 5 to 10%").await.unwrap();
    assert!(outcome.is_success());
    assert_eq!(harness.codes("rollout"), vec![vc(5)]);
}

#[tokio::test]
async fn chat_input_error_never_reaches_service() {
    let harness = Harness::new(vec![track("beta", &[5])]);

    let err = say(&harness, "U-LEAD", "rollout wallet 5 to lots%").await.unwrap_err();

    assert_eq!(err, "Sorry, I don't understand that user percentage.");
    assert!(harness.publisher.calls().is_empty());
}

proptest! {
    #[test]
    fn unknown_words_are_help(word in "[a-z]{1,12}") {
        prop_assume!(!["deploy", "halt", "ping", "promote", "rollout", "show"]
            .iter()
            .any(|keyword| word.starts_with(keyword)));

        let parsed = parse_command(&format!("<@U-BOT> {word} wallet 5"));
        prop_assert_eq!(parsed, Ok(Command::Help));
    }

    #[test]
    fn any_positive_version_code_parses(code in 1i64..=i64::MAX) {
        let parsed = parse_command(&format!("<@U-BOT> halt wallet {code}"));
        prop_assert!(matches!(parsed, Ok(Command::Halt { version_code, .. }) if version_code.get() == code), "expected Halt with version_code {}, got {:?}", code, parsed);
    }
}
