pub mod voice_morpher;
