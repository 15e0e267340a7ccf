//! # Bilingual Messages
//!
//! Every coupon and BOGO outcome carries text in both supported locales, so
//! the client picks a language without a second round trip.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

/// A user-facing message in English and Hebrew.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LocalizedMessage {
    pub en: String,
    pub he: String,
}

impl LocalizedMessage {
    pub fn new(en: impl Into<String>, he: impl Into<String>) -> Self {
        LocalizedMessage {
            en: en.into(),
            he: he.into(),
        }
    }

    // =========================================================================
    // Coupon outcomes
    // =========================================================================

    pub fn coupon_applied(label: &str, discount: Money) -> Self {
        Self::new(
            format!("Coupon {label} applied: you saved {discount}"),
            format!("הקופון {label} הופעל: חסכת {discount}"),
        )
    }

    pub fn auto_coupon_applied(label: &str, discount: Money) -> Self {
        Self::new(
            format!("Automatic discount {label} applied: you saved {discount}"),
            format!("הנחה אוטומטית {label} הופעלה: חסכת {discount}"),
        )
    }

    pub fn coupon_not_found(code: &str) -> Self {
        Self::new(
            format!("Coupon {code} does not exist or has expired"),
            format!("הקופון {code} אינו קיים או שפג תוקפו"),
        )
    }

    pub fn below_minimum(code: &str, minimum: Money) -> Self {
        Self::new(
            format!("Coupon {code} requires a cart total of at least {minimum}"),
            format!("הקופון {code} דורש סכום הזמנה של לפחות {minimum}"),
        )
    }

    pub fn not_stackable(code: &str) -> Self {
        Self::new(
            format!("Coupon {code} cannot be combined with the coupons already applied"),
            format!("לא ניתן לשלב את הקופון {code} עם הקופונים שכבר הופעלו"),
        )
    }

    pub fn no_eligible_items(code: &str) -> Self {
        Self::new(
            format!("Coupon {code} does not apply to any item in your cart"),
            format!("הקופון {code} אינו חל על אף פריט בעגלה"),
        )
    }

    pub fn no_auto_coupon() -> Self {
        Self::new(
            "No automatic discount is available for this cart",
            "אין הנחה אוטומטית זמינה לעגלה זו",
        )
    }

    // =========================================================================
    // BOGO
    // =========================================================================

    /// Summary for a BOGO computation; nudges the customer when a group has
    /// an unpaired unit.
    pub fn bogo_summary(discount: Money, has_leftover: bool) -> Self {
        match (discount.is_positive(), has_leftover) {
            (true, false) => Self::new(
                format!("Pair deal applied: you saved {discount}"),
                format!("מבצע זוגות הופעל: חסכת {discount}"),
            ),
            (true, true) => Self::new(
                format!("Pair deal applied: you saved {discount}. Add one more item to complete another pair"),
                format!("מבצע זוגות הופעל: חסכת {discount}. הוסיפו פריט נוסף כדי להשלים זוג"),
            ),
            (false, true) => Self::new(
                "Add one more item from the same collection to get the pair deal",
                "הוסיפו פריט נוסף מאותה קולקציה כדי ליהנות ממבצע הזוגות",
            ),
            (false, false) => Self::new("No pair deal in this cart", "אין מבצע זוגות בעגלה זו"),
        }
    }

    // =========================================================================
    // Generic failures
    // =========================================================================

    pub fn invalid_request(detail: &str) -> Self {
        Self::new(
            format!("Invalid request: {detail}"),
            format!("בקשה לא תקינה: {detail}"),
        )
    }

    pub fn unauthenticated() -> Self {
        Self::new("Please sign in and try again", "יש להתחבר ולנסות שוב")
    }

    pub fn profile_not_found() -> Self {
        Self::new(
            "Please complete your profile before checking out",
            "יש להשלים את הפרופיל לפני המעבר לתשלום",
        )
    }

    pub fn not_found(what: &str) -> Self {
        Self::new(format!("{what} was not found"), format!("{what} לא נמצא"))
    }

    pub fn unknown_error() -> Self {
        Self::new(
            "Something went wrong, please try again",
            "משהו השתבש, נסו שוב",
        )
    }
}
