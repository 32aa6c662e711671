//! Minimal inline HTML rendering
//!
//! There is no template engine: handlers assemble small pages from
//! these helpers. Every piece of user-sourced text goes through
//! html-escape on the way out.

use html_escape::{encode_double_quoted_attribute, encode_text};

use crate::data::{MessageWithAuthor, User, UserStats};

/// Wrap body content in the shared page shell, rendering the pending
/// flash message (if any) above it.
pub fn page(title: &str, flash: Option<&str>, body: &str) -> String {
    let flash_html = match flash {
        Some(message) => format!("<div class=\"alert\">{}</div>\n", encode_text(message)),
        None => String::new(),
    };

    format!(
        "<!DOCTYPE html>\n\
         <html>\n\
         <head><title>{title} / Warbler</title></head>\n\
         <body>\n\
         {flash_html}{body}\n\
         </body>\n\
         </html>\n",
        title = encode_text(title),
    )
}

/// One user in a list (search results, follower pages)
pub fn user_card(user: &User) -> String {
    let bio = match &user.bio {
        Some(bio) => format!("<p class=\"bio\">{}</p>", encode_text(bio)),
        None => String::new(),
    };

    format!(
        "<li class=\"user-card\">\
         <img src=\"{image}\" alt=\"\">\
         <a href=\"/users/{id}\"><p>@{username}</p></a>\
         {bio}\
         </li>",
        image = encode_double_quoted_attribute(&user.image_url),
        id = user.id,
        username = encode_text(&user.username),
    )
}

/// A list of user cards
pub fn user_list(users: &[User]) -> String {
    let cards: Vec<String> = users.iter().map(user_card).collect();
    format!("<ul class=\"user-index\">{}</ul>", cards.join("\n"))
}

/// One message in a list
pub fn message_item(message: &MessageWithAuthor) -> String {
    format!(
        "<li class=\"message\">\
         <a href=\"/users/{user_id}\"><span class=\"author\">@{username}</span></a>\
         <a href=\"/messages/{id}\"><p>{text}</p></a>\
         <span class=\"timestamp\">{timestamp}</span>\
         </li>",
        user_id = message.user_id,
        username = encode_text(&message.username),
        id = message.id,
        text = encode_text(&message.text),
        timestamp = message.created_at.format("%d %B %Y"),
    )
}

/// A list of messages
pub fn message_list(messages: &[MessageWithAuthor]) -> String {
    let items: Vec<String> = messages.iter().map(message_item).collect();
    format!("<ul class=\"messages\">{}</ul>", items.join("\n"))
}

/// The four profile stats, in display order
pub fn stats_list(stats: &UserStats) -> String {
    format!(
        "<ul class=\"user-stats\">\
         <li class=\"stat\" data-stat=\"messages\">{messages}</li>\
         <li class=\"stat\" data-stat=\"following\">{following}</li>\
         <li class=\"stat\" data-stat=\"followers\">{followers}</li>\
         <li class=\"stat\" data-stat=\"likes\">{likes}</li>\
         </ul>",
        messages = stats.messages,
        following = stats.following,
        followers = stats.followers,
        likes = stats.likes,
    )
}

/// Profile header shared by the user detail and follow pages
pub fn profile_header(user: &User, stats: &UserStats) -> String {
    let location = match &user.location {
        Some(location) => format!("<p class=\"location\">{}</p>", encode_text(location)),
        None => String::new(),
    };
    let bio = match &user.bio {
        Some(bio) => format!("<p class=\"bio\">{}</p>", encode_text(bio)),
        None => String::new(),
    };

    format!(
        "<div class=\"profile-header\" style=\"background-image: url('{header}')\">\
         <img src=\"{image}\" alt=\"\">\
         <h1>@{username}</h1>\
         {location}{bio}\
         </div>\n{stats}",
        header = encode_double_quoted_attribute(&user.header_image_url),
        image = encode_double_quoted_attribute(&user.image_url),
        username = encode_text(&user.username),
        stats = stats_list(stats),
    )
}
