use std::time::Duration;

use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    net::{
        TcpStream,
        tcp::{OwnedReadHalf, OwnedWriteHalf},
    },
};

use crate::{errors::ClientError, protocol::Command};

/// Connection to the ledger server. Requests are answered in order, one
/// reply line each.
#[derive(Debug)]
pub struct SocketClient {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl SocketClient {
    pub async fn connect(address: &str) -> Result<Self, ClientError> {
        let stream = TcpStream::connect(address).await?;
        let (reader, writer) = stream.into_split();
        Ok(Self {
            reader: BufReader::new(reader),
            writer,
        })
    }

    /// Sends a raw request line and returns the reply line without its
    /// newline.
    pub async fn request(&mut self, line: &str) -> Result<String, ClientError> {
        let mut payload = line.trim_end_matches(['\r', '\n']).to_string();
        payload.push('\n');
        self.writer.write_all(payload.as_bytes()).await?;

        let mut reply = Vec::new();
        let read = self.reader.read_until(b'\n', &mut reply).await?;
        if read == 0 {
            return Err(ClientError::Closed);
        }
        if reply.last() == Some(&b'\n') {
            reply.pop();
        }
        Ok(String::from_utf8_lossy(&reply).into_owned())
    }

    pub async fn send(&mut self, command: &Command) -> Result<String, ClientError> {
        let line = command.to_line()?;
        self.request(&line).await
    }
}

/// Opens a connection, sends one command and returns the reply line.
pub async fn send_once(
    address: &str,
    command: &Command,
    timeout: Duration,
) -> Result<Option<String>, ClientError> {
    let line = command.to_line()?;
    let exchange = async {
        let mut client = SocketClient::connect(address).await?;
        client.request(&line).await
    };
    match tokio::time::timeout(timeout, exchange).await {
        Ok(reply) => reply.map(Some),
        Err(_) => Ok(None),
    }
}

const USAGE: &str = "Cliente listo. Ejemplos:
  GET:1234567890
  PUT:1234567890:Juan:Nieve:150.75
  ADD:1234567890:50
  SUB:1234567890:25
Escriba comando y presione Enter. Ctrl+C para salir.";

/// Interactive prompt: reads commands from stdin, prints each reply.
pub async fn repl(address: &str) -> Result<(), ClientError> {
    println!("Conectando con el servidor en {address}");
    let mut client = SocketClient::connect(address).await?;
    println!("{USAGE}");

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;

        let input = tokio::select! {
            line = stdin.next_line() => line?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(input) = input else {
            println!();
            println!("Saliendo...");
            break;
        };

        let input = input.trim();
        if input.is_empty() {
            continue;
        }

        let reply = client.request(input).await?;
        println!("{reply}");
    }

    Ok(())
}
