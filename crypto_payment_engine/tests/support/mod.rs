use std::collections::HashMap;

use crypto_payment_engine::{
    db_types::{meta_keys, NewOrder, Order, OrderId},
    OrderStore,
    SqliteDatabase,
};
use log::*;
use rust_decimal::Decimal;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpListener,
};

pub async fn new_database() -> SqliteDatabase {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    let path = std::env::temp_dir().join(format!("cpg_scenario_{}.db", rand::random::<u64>()));
    let url = format!("sqlite://{}", path.display());
    let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database");
    db.migrate().await.expect("Error running migrations");
    debug!("🚀️ Test database ready at {url}");
    db
}

/// A fake block explorer. `GET /{address}` is answered with the body registered for that address, or a 404.
pub async fn fake_explorer(bodies: HashMap<&'static str, &'static str>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("Could not bind fake explorer");
    let addr = listener.local_addr().expect("No local address");
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let bodies = bodies.clone();
            tokio::spawn(async move {
                let mut buf = vec![0u8; 8192];
                let n = socket.read(&mut buf).await.unwrap_or(0);
                let request = String::from_utf8_lossy(&buf[..n]);
                let path = request.split_whitespace().nth(1).unwrap_or("/").trim_start_matches('/').to_string();
                let (status, body) = match bodies.get(path.as_str()) {
                    Some(body) => ("200 OK", *body),
                    None => ("404 Not Found", "{}"),
                };
                let response = format!(
                    "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: \
                     close\r\n\r\n{body}",
                    body.len()
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });
    format!("http://{addr}")
}

pub async fn crypto_order(db: &SqliteDatabase, id: &str, currency: &str, amount: &str, wallet: &str) -> Order {
    let oid = OrderId::new(id);
    db.insert_order(NewOrder::new(oid.clone(), "customer".into(), Decimal::ONE_HUNDRED)).await.unwrap();
    let fields = [
        (meta_keys::CURRENCY, currency.to_string()),
        (meta_keys::AMOUNT, amount.to_string()),
        (meta_keys::WALLET, wallet.to_string()),
    ];
    db.save_order_metadata(&oid, &fields).await.unwrap();
    db.fetch_order(&oid).await.unwrap().unwrap()
}
