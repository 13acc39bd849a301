//! Property-based tests for user id extraction

use proptest::prelude::*;
use qualiflow::shared::{extract_user_id, User, UserIdInput};

proptest! {
    #[test]
    fn test_raw_ids_are_trimmed_or_rejected(raw in "\\PC{0,24}") {
        match extract_user_id(raw.as_str()) {
            Some(id) => {
                prop_assert_eq!(id.as_str(), raw.trim());
                prop_assert!(!id.as_str().is_empty());
            }
            None => prop_assert!(raw.trim().is_empty()),
        }
    }

    #[test]
    fn test_user_record_falls_back_to_email(
        id in prop_oneof![Just(String::new()), Just("  ".to_string()), "[a-z0-9_]{1,16}"],
        email in "[a-z]{1,8}@[a-z]{1,8}\\.fr",
    ) {
        let user = User { id: id.clone(), email: email.clone(), ..Default::default() };
        let extracted = extract_user_id(&user).unwrap();

        if id.trim().is_empty() {
            prop_assert_eq!(extracted.as_str(), email.as_str());
        } else {
            prop_assert_eq!(extracted.as_str(), id.trim());
        }
    }

    #[test]
    fn test_extraction_never_panics_on_absent(_ in 0..10u32) {
        prop_assert!(extract_user_id(UserIdInput::Absent).is_none());
        prop_assert!(extract_user_id(None::<String>).is_none());
    }
}
