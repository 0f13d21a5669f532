//! teloxide binding: turns Telegram updates into [`InboundEvent`]s and writes the
//! dispatcher's [`OutboundReply`] back to the chat.

use std::sync::Arc;

use teloxide::dispatching::Dispatcher as UpdateDispatcher;
use teloxide::prelude::*;
use teloxide::types::{
    BotCommand, InlineKeyboardButton, InlineKeyboardMarkup, InputFile, LinkPreviewOptions,
    MessageId, ParseMode,
};
use teloxide::RequestError;
use tracing::{debug, error, info, warn};

use crate::app::Dispatcher;
use crate::failure::RENDER_FAILURE_MESSAGE;
use crate::models::{InboundEvent, MenuOption, OutboundReply};

pub async fn run(bot: Bot, dispatcher: Arc<Dispatcher>) {
    if let Err(e) = bot.set_my_commands(bot_commands()).await {
        warn!("Failed to register bot commands: {}", e);
    }

    let handler = dptree::entry()
        .branch(Update::filter_message().endpoint(on_message))
        .branch(Update::filter_callback_query().endpoint(on_callback));

    info!("Starting Telegram long polling");
    UpdateDispatcher::builder(bot, handler)
        .dependencies(dptree::deps![dispatcher])
        .default_handler(|update| async move {
            debug!("Unhandled update: {:?}", update.kind);
        })
        .error_handler(LoggingErrorHandler::with_custom_text(
            "An error occurred while handling an update",
        ))
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}

pub fn bot_commands() -> Vec<BotCommand> {
    vec![
        BotCommand::new("start", "Show the welcome message"),
        BotCommand::new("latest", "Today's newest releases"),
        BotCommand::new("trending", "Movies trending today"),
        BotCommand::new("search", "Search a movie by title"),
        BotCommand::new("help", "List the available commands"),
    ]
}

async fn on_message(bot: Bot, msg: Message, dispatcher: Arc<Dispatcher>) -> ResponseResult<()> {
    let Some(text) = msg.text() else {
        return Ok(());
    };
    let event = InboundEvent::from_message_text(text);
    info!(chat = msg.chat.id.0, event = event.name(), "Received message");

    let reply = dispatcher.handle(event).await;
    if let Err(e) = send_reply(&bot, msg.chat.id, None, &reply).await {
        error!("Failed to send reply to chat {}: {}", msg.chat.id.0, e);
        bot.send_message(msg.chat.id, RENDER_FAILURE_MESSAGE).await?;
    }
    Ok(())
}

async fn on_callback(bot: Bot, q: CallbackQuery, dispatcher: Arc<Dispatcher>) -> ResponseResult<()> {
    bot.answer_callback_query(q.id.clone()).await?;

    let (Some(data), Some(message)) = (q.data.as_deref(), q.message.as_ref()) else {
        return Ok(());
    };
    let chat_id = message.chat().id;
    let menu_id = message.id();
    let event = InboundEvent::from_callback_data(data);
    info!(chat = chat_id.0, event = event.name(), "Received button press");

    let reply = dispatcher.handle(event).await;
    if let Err(e) = send_reply(&bot, chat_id, Some(menu_id), &reply).await {
        error!("Failed to display selection in chat {}: {}", chat_id.0, e);
        bot.send_message(chat_id, RENDER_FAILURE_MESSAGE).await?;
    }
    Ok(())
}

/// Writes one reply. When `menu_id` is set the reply replaces that menu message:
/// text is edited in place, while a photo card needs the menu deleted first since
/// Telegram cannot turn a text message into a photo message.
async fn send_reply(
    bot: &Bot,
    chat_id: ChatId,
    menu_id: Option<MessageId>,
    reply: &OutboundReply,
) -> Result<(), RequestError> {
    match reply {
        OutboundReply::Acknowledge => Ok(()),
        // Errors leave the menu in place so another option can still be picked.
        OutboundReply::PlainText(text) => send_text(bot, chat_id, None, text, false).await,
        OutboundReply::MenuText { text, options } => {
            bot.send_message(chat_id, text)
                .parse_mode(ParseMode::Html)
                .reply_markup(menu_keyboard(options))
                .await?;
            Ok(())
        }
        OutboundReply::MediaCard {
            image_url: None,
            caption,
            ..
        } => send_text(bot, chat_id, menu_id, caption, true).await,
        OutboundReply::MediaCard {
            image_url: Some(image_url),
            caption,
            ..
        } => {
            let Ok(url) = reqwest::Url::parse(image_url) else {
                warn!("Poster URL is not valid, sending text card: {}", image_url);
                return send_text(bot, chat_id, menu_id, caption, true).await;
            };
            if let Some(id) = menu_id {
                if let Err(e) = bot.delete_message(chat_id, id).await {
                    warn!("Failed to delete menu message {:?}: {}", id, e);
                }
            }
            let sent = bot
                .send_photo(chat_id, InputFile::url(url))
                .caption(caption)
                .parse_mode(ParseMode::Html)
                .await;
            match sent {
                Ok(_) => Ok(()),
                Err(e) => {
                    warn!("Photo card rejected, falling back to text: {}", e);
                    send_text(bot, chat_id, None, caption, true).await
                }
            }
        }
    }
}

async fn send_text(
    bot: &Bot,
    chat_id: ChatId,
    menu_id: Option<MessageId>,
    text: &str,
    hide_preview: bool,
) -> Result<(), RequestError> {
    let preview = LinkPreviewOptions {
        is_disabled: hide_preview,
        url: None,
        prefer_small_media: false,
        prefer_large_media: false,
        show_above_text: false,
    };
    match menu_id {
        Some(id) => {
            bot.edit_message_text(chat_id, id, text)
                .parse_mode(ParseMode::Html)
                .link_preview_options(preview)
                .await?;
        }
        None => {
            bot.send_message(chat_id, text)
                .parse_mode(ParseMode::Html)
                .link_preview_options(preview)
                .await?;
        }
    }
    Ok(())
}

pub fn menu_keyboard(options: &[MenuOption]) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(
        options
            .iter()
            .map(|o| vec![InlineKeyboardButton::callback(o.label.clone(), o.token.clone())]),
    )
}
