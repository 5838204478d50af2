use auction_engine::protocol::{ClientMessage, NewOrderRequest, ServerMessage};
use bytes::Bytes;
use clap::Parser;
use futures::{SinkExt, StreamExt};
use rand::Rng;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_util::codec::{Framed, LengthDelimitedCodec};

/// 压测客户端：并发提交随机限价单
#[derive(Parser, Debug)]
#[command(name = "load-generator")]
struct Args {
    /// 服务器地址
    #[arg(short, long, default_value = "127.0.0.1:5001")]
    server: SocketAddr,

    /// 并发客户端数量
    #[arg(short, long, default_value_t = 8)]
    clients: u32,

    /// 测试持续时间（秒）
    #[arg(short, long, default_value_t = 10)]
    duration: u64,

    /// 资产名称
    #[arg(short, long, default_value = "BTC")]
    asset: String,
}

#[derive(Default)]
struct Counters {
    sent: AtomicU64,
    accepted: AtomicU64,
    rejected: AtomicU64,
    // 每个客户端都会收到全部成交广播
    trades_seen: AtomicU64,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    let duration = Duration::from_secs(args.duration);

    println!("启动吞吐量测试...");
    println!("服务器: {}", args.server);
    println!("模拟客户端数量: {}", args.clients);
    println!("测试持续时间: {:?}", duration);

    let counters = Arc::new(Counters::default());
    let (latency_tx, mut latency_rx) = mpsc::unbounded_channel::<u128>();

    for client_id in 0..args.clients {
        let counters = counters.clone();
        let latency_tx = latency_tx.clone();
        let asset = args.asset.clone();
        let server = args.server;
        tokio::spawn(async move {
            run_client(client_id, server, asset, counters, latency_tx).await;
        });
    }
    drop(latency_tx);

    tokio::time::sleep(duration).await;

    let secs = duration.as_secs_f64();
    let sent = counters.sent.load(Ordering::Relaxed);
    let accepted = counters.accepted.load(Ordering::Relaxed);
    let rejected = counters.rejected.load(Ordering::Relaxed);
    let trades = counters.trades_seen.load(Ordering::Relaxed) / u64::from(args.clients.max(1));

    let mut latencies = Vec::new();
    while let Ok(latency) = latency_rx.try_recv() {
        latencies.push(latency);
    }
    latencies.sort_unstable();
    let avg = if latencies.is_empty() {
        0.0
    } else {
        latencies.iter().sum::<u128>() as f64 / latencies.len() as f64
    };
    let p99 = latencies
        .get(latencies.len().saturating_sub(1) * 99 / 100)
        .copied()
        .unwrap_or(0);

    println!("\n--- 测试结果 ---");
    println!("已发送订单: {}", sent);
    println!("已确认订单: {} ({:.2}/s)", accepted, accepted as f64 / secs);
    println!("被拒订单:   {}", rejected);
    println!("成交笔数:   {} ({:.2}/s)", trades, trades as f64 / secs);
    println!("平均确认延迟: {:.2} µs", avg / 1000.0);
    println!("P99 确认延迟: {:.2} µs", p99 as f64 / 1000.0);

    std::process::exit(0);
}

async fn run_client(
    client_id: u32,
    server: SocketAddr,
    asset: String,
    counters: Arc<Counters>,
    latency_tx: mpsc::UnboundedSender<u128>,
) {
    let stream = match TcpStream::connect(server).await {
        Ok(s) => s,
        Err(e) => {
            eprintln!("[客户端 {}] 连接失败: {}", client_id, e);
            return;
        }
    };

    let (mut writer, mut reader) = Framed::new(stream, LengthDelimitedCodec::new()).split::<Bytes>();
    // 同一连接上的回复与请求顺序一致
    let (sent_tx, mut sent_rx) = mpsc::unbounded_channel::<Instant>();

    let reader_counters = counters.clone();
    tokio::spawn(async move {
        while let Some(Ok(buf)) = reader.next().await {
            match serde_json::from_slice::<ServerMessage>(&buf) {
                Ok(ServerMessage::OrderMatched(_)) => {
                    reader_counters.trades_seen.fetch_add(1, Ordering::Relaxed);
                }
                Ok(reply) => {
                    let counter = match reply {
                        ServerMessage::OrderReceived(_) => &reader_counters.accepted,
                        _ => &reader_counters.rejected,
                    };
                    counter.fetch_add(1, Ordering::Relaxed);
                    if let Some(sent_at) = sent_rx.recv().await {
                        let _ = latency_tx.send(sent_at.elapsed().as_nanos());
                    }
                }
                Err(e) => eprintln!("[客户端 {}] 无法解析的响应: {}", client_id, e),
            }
        }
    });

    let user_id = format!("load-{}", client_id);
    loop {
        let request = {
            let mut rng = rand::thread_rng();
            let buy = rng.gen::<bool>();
            // 买卖价格区间部分重叠，保证持续撮合
            let price = if buy {
                rng.gen_range(49_990..=50_005)
            } else {
                rng.gen_range(49_995..=50_010)
            } as f64;
            let amount = rng.gen_range(1..=5);
            if buy {
                NewOrderRequest::buy(user_id.as_str(), asset.as_str(), price, amount)
            } else {
                NewOrderRequest::sell(user_id.as_str(), asset.as_str(), price, amount)
            }
        };

        let frame = match serde_json::to_vec(&ClientMessage::NewOrder(request)) {
            Ok(frame) => frame,
            Err(e) => {
                eprintln!("[客户端 {}] 编码失败: {}", client_id, e);
                continue;
            }
        };
        let sent_at = Instant::now();
        if writer.send(Bytes::from(frame)).await.is_err() {
            break;
        }
        counters.sent.fetch_add(1, Ordering::Relaxed);
        if sent_tx.send(sent_at).is_err() {
            break;
        }
    }
}
