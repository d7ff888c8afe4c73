//! Integration tests for domain_household

use core_kernel::UserId;
use domain_household::User;

// ============================================================================
// User Tests
// ============================================================================

mod user_tests {
    use super::*;

    #[test]
    fn test_user_json_shape() {
        let user = User::with_id(UserId::new(), "Alice").with_email("alice@example.com");
        let json = serde_json::to_value(&user).unwrap();

        assert_eq!(json["display_name"], "Alice");
        assert_eq!(json["email"], "alice@example.com");
        assert_eq!(json["is_active"], true);

        let back: User = serde_json::from_value(json).unwrap();
        assert_eq!(back, user);
    }
}
