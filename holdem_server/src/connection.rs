//! One task per connected client.
//!
//! The first line a client sends is its player id. After that the task
//! forwards its `ACTION` lines to the table and writes every broadcast
//! line the client is allowed to see, until the client disconnects.

use holdem::{
    ActionError, Delivery, TableHandle,
    entities::{PlayerAction, PlayerId},
    table::SeatError,
};
use log::{debug, warn};
use std::{io, net::SocketAddr};
use tokio::{
    io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader},
    net::TcpStream,
    sync::broadcast::{self, error::RecvError},
};

use crate::{
    logging::{log_bad_line, log_connection_event},
    protocol::{ClientLine, Outbound, render},
};

async fn send_line<W>(writer: &mut W, line: &str) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(line.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await
}

/// Serve one client until it disconnects.
pub async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    table: TableHandle,
    outbound: broadcast::Sender<Outbound>,
) -> io::Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    let Some(first) = lines.next_line().await? else {
        log_connection_event(addr, None, "closed before sending an id");
        return Ok(());
    };
    let player_id = PlayerId::new(&first);

    // Subscribe first so this client sees its own SEATINFO.
    let mut updates = outbound.subscribe();
    let seat = match table.join(player_id.clone()).await {
        Ok(seat) => seat,
        Err(SeatError::DuplicateId(_)) => {
            log_connection_event(addr, Some(player_id.as_str()), "duplicate id");
            return send_line(&mut writer, "DUPLICATE_ID").await;
        }
        Err(e) => {
            log_connection_event(addr, Some(player_id.as_str()), &e.to_string());
            return send_line(&mut writer, "REFUSED").await;
        }
    };
    log_connection_event(addr, Some(player_id.as_str()), &format!("seated at {seat}"));
    send_line(&mut writer, &format!("ASSIGNED {seat}")).await?;
    outbound.send(Outbound::Seats(table.seats())).ok();

    let result = serve(&player_id, addr, &table, &mut lines, &mut writer, &mut updates).await;

    if table.leave(&player_id).await.is_ok() {
        outbound
            .send(Outbound::Disconnected(player_id.clone()))
            .ok();
        outbound.send(Outbound::Seats(table.seats())).ok();
    }
    log_connection_event(addr, Some(player_id.as_str()), "disconnected");
    result
}

async fn serve<R, W>(
    player_id: &PlayerId,
    addr: SocketAddr,
    table: &TableHandle,
    lines: &mut tokio::io::Lines<R>,
    writer: &mut W,
    updates: &mut broadcast::Receiver<Outbound>,
) -> io::Result<()>
where
    R: tokio::io::AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    return Ok(());
                };
                match line.parse::<ClientLine>() {
                    Ok(ClientLine::Disconnect) => return Ok(()),
                    Ok(ClientLine::Action(action)) => {
                        match table.act(PlayerAction::new(player_id.clone(), action)) {
                            Ok(Delivery::Accepted | Delivery::DisconnectFold) => {}
                            Ok(Delivery::Ignored) => debug!("{player_id} folded with no round running"),
                            Err(ActionError::TurnViolation(_)) => {
                                debug!("{player_id} acted out of turn");
                            }
                            Err(e) => send_line(writer, &format!("ERROR {e}")).await?,
                        }
                    }
                    Err(e) => {
                        log_bad_line(addr, &line, &e.to_string());
                        // On their turn the table answers with REJECTED
                        // and a new prompt instead.
                        if let Err(e) = table.reject(player_id, e) {
                            send_line(writer, &format!("ERROR {e}")).await?;
                        }
                    }
                }
            }

            update = updates.recv() => {
                match update {
                    Ok(update) => {
                        if let Some(line) = render(&update, player_id) {
                            send_line(writer, &line).await?;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("{player_id} fell behind and missed {skipped} updates");
                    }
                    Err(RecvError::Closed) => return Ok(()),
                }
            }
        }
    }
}
