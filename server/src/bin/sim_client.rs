use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, bail, Context};
use common::{Direction, Point};
use protocol::packets::{
    xor3, ACCOUNT_LEN, CHAT_MESSAGE_LEN, CLIENT_SERIAL_LEN, NAME_LEN, PASSWORD_LONG_LEN,
    PASSWORD_SHORT_LEN,
};
use protocol::{encode_walk_directions, FrameBuilder, HeaderKind};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

#[derive(Debug, Clone)]
struct SimConfig {
    addr: SocketAddr,
    username: String,
    password: String,
    character: String,
    message: String,
    long_password: bool,
    walk_opcode: u8,
    delay_ms: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = parse_args()?;

    println!("[sim-client] connecting to {}", cfg.addr);
    let mut stream = TcpStream::connect(cfg.addr)
        .await
        .with_context(|| format!("failed to connect to {}", cfg.addr))?;
    stream.set_nodelay(true)?;

    for (label, packet) in script(&cfg)? {
        println!("[sim-client] -> {} ({} bytes)", label, packet.len());
        stream
            .write_all(&packet)
            .await
            .with_context(|| format!("failed to send {}", label))?;
        tokio::time::sleep(Duration::from_millis(cfg.delay_ms)).await;
    }

    stream.shutdown().await?;
    println!("[sim-client] script finished");
    Ok(())
}

/// Login, character selection, a short walk, a chat line and logout.
fn script(cfg: &SimConfig) -> anyhow::Result<Vec<(&'static str, Vec<u8>)>> {
    let password_len = if cfg.long_password {
        PASSWORD_LONG_LEN
    } else {
        PASSWORD_SHORT_LEN
    };

    let login = FrameBuilder::new(HeaderKind::C3, 0xF1)
        .sub_opcode(0x01)
        .bytes(&xor3(&fixed_field(&cfg.username, ACCOUNT_LEN)))
        .bytes(&xor3(&fixed_field(&cfg.password, password_len)))
        .bytes(&0u32.to_le_bytes())
        .bytes(b"10404")
        .bytes(&[b'0'; CLIENT_SERIAL_LEN])
        .build()?;

    let character_list = FrameBuilder::new(HeaderKind::C1, 0xF3)
        .sub_opcode(0x00)
        .build()?;

    let select = FrameBuilder::new(HeaderKind::C1, 0xF3)
        .sub_opcode(0x03)
        .fixed_str(&cfg.character, NAME_LEN)
        .build()?;

    let source = Point::new(130, 120);
    let directions = [Direction::East, Direction::East, Direction::SouthEast];
    let walk = FrameBuilder::new(HeaderKind::C1, cfg.walk_opcode)
        .byte(source.x)
        .byte(source.y)
        .byte((Direction::South.to_nibble() << 4) | directions.len() as u8)
        .bytes(&encode_walk_directions(&directions))
        .build()?;

    let chat = FrameBuilder::new(HeaderKind::C1, 0x00)
        .fixed_str(&cfg.character, NAME_LEN)
        .fixed_str(&cfg.message, CHAT_MESSAGE_LEN)
        .build()?;

    let ping = FrameBuilder::new(HeaderKind::C1, 0x0E)
        .bytes(&1u32.to_le_bytes())
        .bytes(&[0; 4])
        .build()?;

    let logout = FrameBuilder::new(HeaderKind::C3, 0xF1)
        .sub_opcode(0x02)
        .byte(0)
        .build()?;

    Ok(vec![
        ("login", login),
        ("character list", character_list),
        ("select character", select),
        ("walk", walk),
        ("chat", chat),
        ("ping", ping),
        ("logout", logout),
    ])
}

fn fixed_field(text: &str, width: usize) -> Vec<u8> {
    let mut field = text.as_bytes().to_vec();
    field.resize(width, 0);
    field
}

fn parse_args() -> anyhow::Result<SimConfig> {
    let mut cfg = SimConfig {
        addr: SocketAddr::from(([127, 0, 0, 1], 55901)),
        username: "test".to_string(),
        password: "test".to_string(),
        character: "Tester".to_string(),
        message: "hello from sim-client".to_string(),
        long_password: true,
        walk_opcode: 0xD4,
        delay_ms: 100,
    };

    let mut args = std::env::args().skip(1).peekable();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--addr" => {
                let value = next_arg_value(&mut args, &arg)?;
                cfg.addr = SocketAddr::from_str(&value)
                    .with_context(|| format!("invalid --addr: {}", value))?;
            }
            "--username" => cfg.username = next_arg_value(&mut args, &arg)?,
            "--password" => cfg.password = next_arg_value(&mut args, &arg)?,
            "--character" => cfg.character = next_arg_value(&mut args, &arg)?,
            "--message" => cfg.message = next_arg_value(&mut args, &arg)?,
            "--short-password" => cfg.long_password = false,
            "--walk-opcode" => {
                let value = next_arg_value(&mut args, &arg)?;
                cfg.walk_opcode = u8::from_str_radix(value.trim_start_matches("0x"), 16)
                    .with_context(|| format!("invalid --walk-opcode: {}", value))?;
            }
            "--delay-ms" => {
                let value = next_arg_value(&mut args, &arg)?;
                cfg.delay_ms = value
                    .parse::<u64>()
                    .with_context(|| format!("invalid --delay-ms: {}", value))?;
            }
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            other => {
                bail!("unknown argument: {}\nUse --help to list the options.", other);
            }
        }
    }

    if cfg.username.len() > ACCOUNT_LEN {
        bail!("--username is limited to {} bytes", ACCOUNT_LEN);
    }

    Ok(cfg)
}

fn next_arg_value<I>(args: &mut std::iter::Peekable<I>, flag: &str) -> anyhow::Result<String>
where
    I: Iterator<Item = String>,
{
    args.next()
        .ok_or_else(|| anyhow!("missing value for {}", flag))
}

fn print_help() {
    println!(
        "sim-client: sends a scripted session to the game gateway\n\n\
         Options:\n  \
         --addr <host:port>       gateway address (default 127.0.0.1:55901)\n  \
         --username <name>        account name\n  \
         --password <secret>      account password\n  \
         --character <name>       character to select\n  \
         --message <text>         chat line to send\n  \
         --short-password         use the 10 byte password field of older clients\n  \
         --walk-opcode <hex>      walk opcode of the emulated client (default D4)\n  \
         --delay-ms <ms>          pause between packets (default 100)"
    );
}
