use std::{collections::HashMap, sync::Arc, time::Duration};

use miniredis::{
    commands::CommandHandler, key_value_store::KeyValueStore, resp::RespValue, state::State,
};
use tokio::sync::Mutex;

fn new_server() -> (Arc<Mutex<KeyValueStore>>, Arc<Mutex<State>>) {
    (
        Arc::new(Mutex::new(HashMap::new())),
        Arc::new(Mutex::new(State::new())),
    )
}

fn command(parts: &[&str]) -> RespValue {
    RespValue::Array(
        parts
            .iter()
            .map(|part| RespValue::BulkString(part.to_string()))
            .collect(),
    )
}

async fn run(
    store: &Arc<Mutex<KeyValueStore>>,
    state: &Arc<Mutex<State>>,
    parts: &[&str],
) -> String {
    let handler = CommandHandler::new(&command(parts)).expect("command frame should parse");

    handler
        .handle_command("127.0.0.1:40000", Arc::clone(store), Arc::clone(state))
        .await
        .unwrap_or_else(|e| e.as_string())
}

#[tokio::test]
async fn test_ping_and_echo() {
    let (store, state) = new_server();

    assert_eq!(run(&store, &state, &["PING"]).await, "+PONG\r\n");
    assert_eq!(run(&store, &state, &["ping"]).await, "+PONG\r\n");
    assert_eq!(
        run(&store, &state, &["ECHO", "hello"]).await,
        "$5\r\nhello\r\n"
    );
    assert_eq!(
        run(&store, &state, &["ECHO"]).await,
        "-ERR wrong number of arguments for 'echo' command\r\n"
    );
}

#[tokio::test]
async fn test_unknown_command() {
    let (store, state) = new_server();

    assert_eq!(
        run(&store, &state, &["FLUSHALL"]).await,
        "-ERR unknown command 'FLUSHALL'\r\n"
    );
}

#[tokio::test]
async fn test_set_and_get() {
    let (store, state) = new_server();

    assert_eq!(
        run(&store, &state, &["SET", "fruit", "mango"]).await,
        "+OK\r\n"
    );
    assert_eq!(
        run(&store, &state, &["GET", "fruit"]).await,
        "$5\r\nmango\r\n"
    );
    assert_eq!(run(&store, &state, &["GET", "missing"]).await, "$-1\r\n");

    // SET overwrites any prior value of any kind.
    assert_eq!(
        run(&store, &state, &["RPUSH", "items", "a"]).await,
        ":1\r\n"
    );
    assert_eq!(
        run(&store, &state, &["SET", "items", "now-a-string"]).await,
        "+OK\r\n"
    );
    assert_eq!(run(&store, &state, &["TYPE", "items"]).await, "+string\r\n");
}

#[tokio::test]
async fn test_set_with_px_expiry() {
    let (store, state) = new_server();

    assert_eq!(
        run(&store, &state, &["SET", "x", "hi", "PX", "50"]).await,
        "+OK\r\n"
    );
    assert_eq!(run(&store, &state, &["GET", "x"]).await, "$2\r\nhi\r\n");

    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(run(&store, &state, &["GET", "x"]).await, "$-1\r\n");
    assert_eq!(run(&store, &state, &["TYPE", "x"]).await, "+none\r\n");
}

#[tokio::test]
async fn test_set_with_ex_expiry() {
    let (store, state) = new_server();

    assert_eq!(
        run(&store, &state, &["SET", "x", "hi", "ex", "100"]).await,
        "+OK\r\n"
    );
    assert_eq!(run(&store, &state, &["GET", "x"]).await, "$2\r\nhi\r\n");
    assert_eq!(run(&store, &state, &["TYPE", "x"]).await, "+string\r\n");
}

#[tokio::test]
async fn test_set_option_grammar() {
    let (store, state) = new_server();

    assert_eq!(
        run(&store, &state, &["SET", "x", "hi", "PX"]).await,
        "-ERR syntax error\r\n"
    );
    assert_eq!(
        run(&store, &state, &["SET", "x", "hi", "EXAT", "5"]).await,
        "-ERR syntax error\r\n"
    );
    assert_eq!(
        run(&store, &state, &["SET", "x", "hi", "PX", "soon"]).await,
        "-ERR value is not an integer or out of range\r\n"
    );
    assert_eq!(
        run(&store, &state, &["SET", "x"]).await,
        "-ERR wrong number of arguments for 'set' command\r\n"
    );
}

#[tokio::test]
async fn test_list_push_pop_history() {
    let (store, state) = new_server();

    assert_eq!(
        run(&store, &state, &["RPUSH", "L", "a", "b", "c"]).await,
        ":3\r\n"
    );
    assert_eq!(run(&store, &state, &["LPUSH", "L", "z"]).await, ":4\r\n");
    assert_eq!(
        run(&store, &state, &["LRANGE", "L", "0", "-1"]).await,
        "*4\r\n$1\r\nz\r\n$1\r\na\r\n$1\r\nb\r\n$1\r\nc\r\n"
    );
    assert_eq!(
        run(&store, &state, &["LPOP", "L", "2"]).await,
        "*2\r\n$1\r\nz\r\n$1\r\na\r\n"
    );
    assert_eq!(run(&store, &state, &["LLEN", "L"]).await, ":2\r\n");
}

#[tokio::test]
async fn test_lpush_prepends_in_reverse_order() {
    let (store, state) = new_server();

    assert_eq!(
        run(&store, &state, &["LPUSH", "L", "a", "b", "c"]).await,
        ":3\r\n"
    );
    assert_eq!(
        run(&store, &state, &["LRANGE", "L", "0", "-1"]).await,
        "*3\r\n$1\r\nc\r\n$1\r\nb\r\n$1\r\na\r\n"
    );
}

#[tokio::test]
async fn test_lrange_clamps_out_of_bounds_indexes() {
    let (store, state) = new_server();

    assert_eq!(
        run(&store, &state, &["RPUSH", "L", "a", "b", "c"]).await,
        ":3\r\n"
    );
    assert_eq!(
        run(&store, &state, &["LRANGE", "L", "-100", "100"]).await,
        "*3\r\n$1\r\na\r\n$1\r\nb\r\n$1\r\nc\r\n"
    );
    assert_eq!(
        run(&store, &state, &["LRANGE", "L", "5", "10"]).await,
        "*0\r\n"
    );
    assert_eq!(
        run(&store, &state, &["LRANGE", "missing", "0", "-1"]).await,
        "*0\r\n"
    );
    assert_eq!(
        run(&store, &state, &["LRANGE", "L", "zero", "-1"]).await,
        "-ERR value is not an integer or out of range\r\n"
    );
}

#[tokio::test]
async fn test_lpop_variants() {
    let (store, state) = new_server();

    assert_eq!(run(&store, &state, &["LPOP", "missing"]).await, "$-1\r\n");
    assert_eq!(
        run(&store, &state, &["LPOP", "missing", "2"]).await,
        "*-1\r\n"
    );

    assert_eq!(run(&store, &state, &["RPUSH", "L", "a"]).await, ":1\r\n");
    assert_eq!(run(&store, &state, &["LPOP", "L"]).await, "$1\r\na\r\n");
    // Popping the last element removes the key entirely.
    assert_eq!(run(&store, &state, &["TYPE", "L"]).await, "+none\r\n");

    assert_eq!(
        run(&store, &state, &["RPUSH", "L", "a", "b"]).await,
        ":2\r\n"
    );
    assert_eq!(run(&store, &state, &["LPOP", "L", "0"]).await, "*0\r\n");
    assert_eq!(run(&store, &state, &["LLEN", "L"]).await, ":2\r\n");

    // Count larger than the list drains it.
    assert_eq!(
        run(&store, &state, &["LPOP", "L", "5"]).await,
        "*2\r\n$1\r\na\r\n$1\r\nb\r\n"
    );
    assert_eq!(run(&store, &state, &["LLEN", "L"]).await, ":0\r\n");

    assert_eq!(
        run(&store, &state, &["LPOP", "L", "-1"]).await,
        "-ERR value is out of range, must be positive\r\n"
    );
}

#[tokio::test]
async fn test_wrong_kind_operations_fail_without_mutation() {
    let (store, state) = new_server();

    assert_eq!(
        run(&store, &state, &["SET", "fruit", "mango"]).await,
        "+OK\r\n"
    );

    let wrongtype = "-WRONGTYPE Operation against a key holding the wrong kind of value\r\n";

    assert_eq!(run(&store, &state, &["RPUSH", "fruit", "a"]).await, wrongtype);
    assert_eq!(run(&store, &state, &["LLEN", "fruit"]).await, wrongtype);
    assert_eq!(
        run(&store, &state, &["LRANGE", "fruit", "0", "-1"]).await,
        wrongtype
    );
    assert_eq!(run(&store, &state, &["LPOP", "fruit"]).await, wrongtype);
    assert_eq!(
        run(&store, &state, &["BLPOP", "fruit", "0.1"]).await,
        wrongtype
    );
    assert_eq!(
        run(&store, &state, &["XADD", "fruit", "1-1", "f", "v"]).await,
        wrongtype
    );
    assert_eq!(
        run(&store, &state, &["XRANGE", "fruit", "-", "+"]).await,
        wrongtype
    );
    assert_eq!(
        run(&store, &state, &["XREAD", "STREAMS", "fruit", "0-0"]).await,
        wrongtype
    );

    // The key is still the original string.
    assert_eq!(
        run(&store, &state, &["GET", "fruit"]).await,
        "$5\r\nmango\r\n"
    );

    // And GET against a list reports the mismatch the same way.
    assert_eq!(run(&store, &state, &["RPUSH", "L", "a"]).await, ":1\r\n");
    assert_eq!(run(&store, &state, &["GET", "L"]).await, wrongtype);
}

#[tokio::test]
async fn test_type_command() {
    let (store, state) = new_server();

    assert_eq!(
        run(&store, &state, &["SET", "fruit", "mango"]).await,
        "+OK\r\n"
    );
    assert_eq!(run(&store, &state, &["RPUSH", "L", "a"]).await, ":1\r\n");
    assert_eq!(
        run(&store, &state, &["XADD", "S", "1-1", "f", "v"]).await,
        "$3\r\n1-1\r\n"
    );

    assert_eq!(run(&store, &state, &["TYPE", "fruit"]).await, "+string\r\n");
    assert_eq!(run(&store, &state, &["TYPE", "L"]).await, "+list\r\n");
    assert_eq!(run(&store, &state, &["TYPE", "S"]).await, "+stream\r\n");
    assert_eq!(run(&store, &state, &["TYPE", "missing"]).await, "+none\r\n");
}

#[tokio::test]
async fn test_xadd_id_ordering_rules() {
    let (store, state) = new_server();

    assert_eq!(
        run(&store, &state, &["XADD", "s", "1-1", "f1", "v1"]).await,
        "$3\r\n1-1\r\n"
    );
    assert_eq!(
        run(&store, &state, &["XADD", "s", "1-1", "f1", "v1"]).await,
        "-ERR The ID specified in XADD is equal or smaller than the target stream top item\r\n"
    );
    assert_eq!(
        run(&store, &state, &["XADD", "s", "1-*", "f1", "v1"]).await,
        "$3\r\n1-2\r\n"
    );
    assert_eq!(
        run(&store, &state, &["XADD", "s", "0-0", "f", "v"]).await,
        "-ERR The ID specified in XADD must be greater than 0-0\r\n"
    );
    assert_eq!(
        run(&store, &state, &["XADD", "s", "0-5", "f", "v"]).await,
        "-ERR The ID specified in XADD is equal or smaller than the target stream top item\r\n"
    );

    // The rejected entries were not appended.
    assert_eq!(
        run(&store, &state, &["XRANGE", "s", "-", "+"]).await,
        "*2\r\n*2\r\n$3\r\n1-1\r\n*2\r\n$2\r\nf1\r\n$2\r\nv1\r\n\
         *2\r\n$3\r\n1-2\r\n*2\r\n$2\r\nf1\r\n$2\r\nv1\r\n"
    );
}

#[tokio::test]
async fn test_xadd_zero_bucket_starts_at_one() {
    let (store, state) = new_server();

    assert_eq!(
        run(&store, &state, &["XADD", "s", "0-*", "f", "v"]).await,
        "$3\r\n0-1\r\n"
    );
}

#[tokio::test]
async fn test_xadd_with_wrong_arity() {
    let (store, state) = new_server();

    let wrong_arity = "-ERR wrong number of arguments for 'xadd' command\r\n";

    assert_eq!(run(&store, &state, &["XADD", "s", "1-1"]).await, wrong_arity);
    assert_eq!(
        run(&store, &state, &["XADD", "s", "1-1", "f1", "v1", "f2"]).await,
        wrong_arity
    );
}

#[tokio::test]
async fn test_xadd_auto_generated_id() {
    let (store, state) = new_server();

    let reply = run(&store, &state, &["XADD", "s", "*", "f", "v"]).await;

    assert!(reply.starts_with('$'), "unexpected reply {:?}", reply);
    assert_eq!(run(&store, &state, &["TYPE", "s"]).await, "+stream\r\n");
}

#[tokio::test]
async fn test_xrange_bounds() {
    let (store, state) = new_server();

    run(&store, &state, &["XADD", "s", "1-1", "a", "1"]).await;
    run(&store, &state, &["XADD", "s", "1-2", "b", "2"]).await;
    run(&store, &state, &["XADD", "s", "2-1", "c", "3"]).await;

    let first = "*2\r\n$3\r\n1-1\r\n*2\r\n$1\r\na\r\n$1\r\n1\r\n";
    let second = "*2\r\n$3\r\n1-2\r\n*2\r\n$1\r\nb\r\n$1\r\n2\r\n";
    let third = "*2\r\n$3\r\n2-1\r\n*2\r\n$1\r\nc\r\n$1\r\n3\r\n";

    assert_eq!(
        run(&store, &state, &["XRANGE", "s", "-", "+"]).await,
        format!("*3\r\n{}{}{}", first, second, third)
    );

    // A bare millisecond bound covers its whole bucket.
    assert_eq!(
        run(&store, &state, &["XRANGE", "s", "1", "1"]).await,
        format!("*2\r\n{}{}", first, second)
    );

    assert_eq!(
        run(&store, &state, &["XRANGE", "s", "1-2", "2-1"]).await,
        format!("*2\r\n{}{}", second, third)
    );

    assert_eq!(
        run(&store, &state, &["XRANGE", "s", "5", "+"]).await,
        "*0\r\n"
    );
    assert_eq!(
        run(&store, &state, &["XRANGE", "missing", "-", "+"]).await,
        "*0\r\n"
    );
}

#[tokio::test]
async fn test_xadd_preserves_field_order() {
    let (store, state) = new_server();

    run(
        &store,
        &state,
        &["XADD", "s", "1-1", "humidity", "60", "temperature", "25"],
    )
    .await;

    assert_eq!(
        run(&store, &state, &["XRANGE", "s", "-", "+"]).await,
        "*1\r\n*2\r\n$3\r\n1-1\r\n*4\r\n$8\r\nhumidity\r\n$2\r\n60\r\n\
         $11\r\ntemperature\r\n$2\r\n25\r\n"
    );
}

#[tokio::test]
async fn test_xread_returns_only_streams_with_matches() {
    let (store, state) = new_server();

    run(&store, &state, &["XADD", "s1", "1-0", "temp", "25"]).await;

    assert_eq!(
        run(&store, &state, &["XREAD", "STREAMS", "s1", "s2", "0-0", "0-0"]).await,
        "*1\r\n*2\r\n$2\r\ns1\r\n*1\r\n*2\r\n$3\r\n1-0\r\n*2\r\n$4\r\ntemp\r\n$2\r\n25\r\n"
    );

    // Nothing matches anywhere: nil array.
    assert_eq!(
        run(&store, &state, &["XREAD", "STREAMS", "e1", "e2", "0-0", "0-0"]).await,
        "*-1\r\n"
    );
}

#[tokio::test]
async fn test_xread_is_exclusive_of_the_given_id() {
    let (store, state) = new_server();

    run(&store, &state, &["XADD", "s", "1-0", "a", "1"]).await;
    run(&store, &state, &["XADD", "s", "1-1", "b", "2"]).await;

    // After the last entry: nothing.
    assert_eq!(
        run(&store, &state, &["XREAD", "STREAMS", "s", "1-1"]).await,
        "*-1\r\n"
    );

    // After the second-to-last entry: exactly the last one.
    assert_eq!(
        run(&store, &state, &["XREAD", "STREAMS", "s", "1-0"]).await,
        "*1\r\n*2\r\n$1\r\ns\r\n*1\r\n*2\r\n$3\r\n1-1\r\n*2\r\n$1\r\nb\r\n$1\r\n2\r\n"
    );

    // A bare millisecond skips its entire bucket.
    assert_eq!(
        run(&store, &state, &["XREAD", "STREAMS", "s", "1"]).await,
        "*-1\r\n"
    );

    run(&store, &state, &["XADD", "s", "2-0", "c", "3"]).await;

    assert_eq!(
        run(&store, &state, &["XREAD", "STREAMS", "s", "1"]).await,
        "*1\r\n*2\r\n$1\r\ns\r\n*1\r\n*2\r\n$3\r\n2-0\r\n*2\r\n$1\r\nc\r\n$1\r\n3\r\n"
    );
}

#[tokio::test]
async fn test_xread_option_grammar() {
    let (store, state) = new_server();

    assert_eq!(
        run(&store, &state, &["XREAD", "COUNT", "s", "0-0"]).await,
        "-ERR syntax error\r\n"
    );
    assert_eq!(
        run(&store, &state, &["XREAD", "STREAMS", "s1", "s2", "0-0"]).await,
        "-ERR Unbalanced XREAD list of streams: for each stream key an ID must be specified\r\n"
    );
    assert_eq!(
        run(&store, &state, &["XREAD", "streams", "missing", "0-0"]).await,
        "*-1\r\n"
    );
}

#[tokio::test]
async fn test_blpop_pops_immediately_when_element_available() {
    let (store, state) = new_server();

    assert_eq!(
        run(&store, &state, &["RPUSH", "q", "a", "b"]).await,
        ":2\r\n"
    );
    assert_eq!(
        run(&store, &state, &["BLPOP", "q", "1"]).await,
        "*2\r\n$1\r\nq\r\n$1\r\na\r\n"
    );
    assert_eq!(run(&store, &state, &["LLEN", "q"]).await, ":1\r\n");

    // Taking the last element removes the key.
    assert_eq!(
        run(&store, &state, &["BLPOP", "q", "1"]).await,
        "*2\r\n$1\r\nq\r\n$1\r\nb\r\n"
    );
    assert_eq!(run(&store, &state, &["TYPE", "q"]).await, "+none\r\n");
}

#[tokio::test]
async fn test_blpop_timeout_grammar() {
    let (store, state) = new_server();

    assert_eq!(
        run(&store, &state, &["BLPOP", "q"]).await,
        "-ERR wrong number of arguments for 'blpop' command\r\n"
    );
    assert_eq!(
        run(&store, &state, &["BLPOP", "q", "soon"]).await,
        "-ERR timeout is not a float or out of range\r\n"
    );
    assert_eq!(
        run(&store, &state, &["BLPOP", "q", "-1"]).await,
        "-ERR timeout is negative\r\n"
    );
}
