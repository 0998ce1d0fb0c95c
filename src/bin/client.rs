//! Interactive chat client
//!
//! Thin terminal front end over [`linechat::ChatClient`]: the first
//! input line sets the nickname, every following line is sent as a chat
//! message, and incoming events print as formatted notifications.

use std::env;

use tokio::io::{AsyncBufReadExt, BufReader};

use linechat::{ChatClient, Frame, ProtocolError};

/// Default server address
const DEFAULT_ADDR: &str = "127.0.0.1:3333";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let addr = env::args().nth(1).unwrap_or_else(|| DEFAULT_ADDR.to_string());

    println!("Chat console");
    println!("===============");
    let client = ChatClient::connect(&addr).await?;
    println!("Connected to {addr}");

    let (mut events, mut sender) = client.split();

    // notifications print from their own task so slow typing never
    // delays them
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(frame) => print_notification(&frame),
                Err(ProtocolError::ConnectionClosed) => {
                    eprintln!("Server disconnected");
                    std::process::exit(0);
                }
                Err(e) => {
                    eprintln!("Connection error: {e}");
                    std::process::exit(1);
                }
            }
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("Set up your name:");
    let Some(name) = lines.next_line().await? else {
        return Ok(());
    };
    sender.set_name(name.trim()).await?;
    println!("Welcome {}", sender.name());

    while let Some(line) = lines.next_line().await? {
        sender.send_message(&line).await?;
    }

    Ok(())
}

fn print_notification(frame: &Frame) {
    match frame {
        Frame::Message { name, message } => println!("[User] {name}: {message}"),
        Frame::Online { remote_addr } => {
            println!("[System] New client is online: {remote_addr}")
        }
        Frame::Leave { name } => println!("[System] {name} left"),
        Frame::Nickname { remote_addr, name } => {
            println!("[System] Client {remote_addr} set nickname: {name}")
        }
        // SEND and NAME are client-to-server commands; a well-behaved
        // server never emits them
        other => println!("[System] Unexpected message: {other:?}"),
    }
}
