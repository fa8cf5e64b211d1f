pub mod generate;
pub mod timing;
pub mod tts;
pub mod users;
pub mod vocabulary;
pub mod words;
