//! Message composition for Slack notifications
//!
//! Pure formatting only. Delivery goes through `ChatPlatform::send_webhook_message`.

use chrono::NaiveDate;
use serde::Serialize;

use crate::slack::BotConfig;
use crate::types::LinkedUser;

/// Incoming-webhook payload understood by Slack.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WebhookPayload {
    pub text: String,
    pub username: String,
    pub icon_emoji: String,
    pub channel: String,
}

/// Build the payload for a message posted as the given bot.
pub fn webhook_payload(text: String, bot: &BotConfig) -> WebhookPayload {
    WebhookPayload {
        text,
        username: bot.bot_name.clone(),
        icon_emoji: bot.bot_emoji.clone(),
        channel: bot.channel.clone(),
    }
}

/// Slack mention markup for a linked user.
pub fn mention(user: &LinkedUser) -> String {
    format!("<@{}|{}>", user.chat_account.id, user.chat_account.name)
}

/// "a", "a and b", "a, b, and c"
pub fn oxford_join(items: &[String]) -> String {
    match items {
        [] => String::new(),
        [only] => only.clone(),
        [first, second] => format!("{} and {}", first, second),
        [init @ .., last] => format!("{}, and {}", init.join(", "), last),
    }
}

pub fn compose_nag_message(users: &[LinkedUser], reporting_day: NaiveDate) -> String {
    let mentions: Vec<String> = users.iter().map(mention).collect();
    format!(
        "Hey {}. Could you check your timesheets are up to date for {}?",
        oxford_join(&mentions),
        reporting_day.format("%A")
    )
}

pub fn compose_percentage_message(percent_rounded: u32) -> String {
    format!("The billable percentage for this week is {}%.", percent_rounded)
}
