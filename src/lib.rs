pub mod app;
pub mod config;
pub mod failure;
pub mod health;
pub mod models;
pub mod render;
pub mod selection;
pub mod telegram;
pub mod tmdb;
