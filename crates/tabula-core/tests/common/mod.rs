#![allow(dead_code)]

use tabula_core::ast::{Command, CreateTable, Delete, Insert, Load, Select, Update};
use tabula_core::{ParseError, Parser};

pub fn parse(input: &str) -> Command {
    Parser::new(input)
        .parse_command()
        .unwrap_or_else(|e| panic!("Failed to parse: {input}\nError: {e:?}"))
}

pub fn parse_err(input: &str) -> ParseError {
    Parser::new(input)
        .parse_command()
        .expect_err(&format!("Expected parse error for: {input}"))
}

pub fn parse_create(input: &str) -> CreateTable {
    match parse(input) {
        Command::CreateTable(c) => c,
        other => panic!("Expected CREATE TABLE, got {other:?}"),
    }
}

pub fn parse_load(input: &str) -> Load {
    match parse(input) {
        Command::Load(l) => l,
        other => panic!("Expected LOAD, got {other:?}"),
    }
}

pub fn parse_insert(input: &str) -> Insert {
    match parse(input) {
        Command::Insert(i) => i,
        other => panic!("Expected INSERT, got {other:?}"),
    }
}

pub fn parse_select(input: &str) -> Select {
    match parse(input) {
        Command::Select(s) => s,
        other => panic!("Expected SELECT, got {other:?}"),
    }
}

pub fn parse_update(input: &str) -> Update {
    match parse(input) {
        Command::Update(u) => u,
        other => panic!("Expected UPDATE, got {other:?}"),
    }
}

pub fn parse_delete(input: &str) -> Delete {
    match parse(input) {
        Command::Delete(d) => d,
        other => panic!("Expected DELETE, got {other:?}"),
    }
}
