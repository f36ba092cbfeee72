pub mod api;
pub mod auth;
pub mod bootstrap;
pub mod config;
pub mod domain;
pub mod error;
pub mod mail;
pub mod repository;
pub mod service;
pub mod web;
