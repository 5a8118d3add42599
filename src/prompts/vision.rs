/// Sent alongside an image to recover the number printed on it.
pub const READ_NUMBER_PROMPT: &str = "This image is synthetic test data. Read the longest number printed in it and reply with that number only, digits and spaces, no other text.";
