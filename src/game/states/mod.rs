pub mod playing;
