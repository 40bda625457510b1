use crate::*;

/// A presence on one line-protocol connection: handles registration and
/// throttles outbound chat so the remote service's limits are respected.
pub struct ChatSession {
    connection: Connection,
    throttle: TokenBucket,
}

impl ChatSession {
    pub fn new(connection: Connection, throttle_settings: ThrottleSettings) -> Self {
        Self {
            connection,
            throttle: TokenBucket::new(throttle_settings),
        }
    }

    /// Run the registration exchange: PASS, then NICK, then JOIN, strictly
    /// in that order.
    pub async fn register(
        &self,
        token: &str,
        nickname: &str,
        channel: &str,
    ) -> Result<(), ConnectionError> {
        let mut chain = Chain::new();

        for msg in [
            messages::pass(token),
            messages::nick(nickname),
            messages::join(channel),
        ] {
            let connection = self.connection.clone();
            chain.add_sync(move || connection.send(msg));
        }

        chain.execute().await
    }

    /// Send a channel message, subject to the token bucket.
    pub fn say(&mut self, target: &str, text: &str) -> Result<(), ConnectionError> {
        if !self.throttle.try_use() {
            return Err(ConnectionError::Throttled);
        }
        self.connection.send(messages::privmsg(target, text))
    }

    /// Answer a server PING.
    pub fn pong(&self, server: &str) -> Result<(), ConnectionError> {
        self.connection.send(messages::pong(server))
    }

    pub fn leave(&self, channel: &str) -> Result<(), ConnectionError> {
        self.connection.send(messages::part(channel))
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::internal::ConnectionControlDetail;
    use tokio::sync::mpsc::channel;

    fn session_with_channel() -> (
        ChatSession,
        tokio::sync::mpsc::Receiver<ConnectionControlDetail>,
    ) {
        let (control_send, control_recv) = channel(16);
        let id = ConnectionIdGenerator::new(1).next();
        let connection = Connection::new(id, Protocol::Line, control_send);
        let session = ChatSession::new(
            connection,
            ThrottleSettings {
                capacity: 2,
                refill_seconds: 600,
            },
        );
        (session, control_recv)
    }

    async fn next_sent(recv: &mut tokio::sync::mpsc::Receiver<ConnectionControlDetail>) -> String {
        match recv.recv().await.expect("control channel closed") {
            ConnectionControlDetail::Send(msg) => msg,
            other => panic!("expected Send, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn registration_sends_in_order() {
        let (session, mut control) = session_with_channel();

        session.register("secret", "tester", "#chan").await.unwrap();

        assert_eq!(next_sent(&mut control).await, "PASS secret\r\n");
        assert_eq!(next_sent(&mut control).await, "NICK tester\r\n");
        assert_eq!(next_sent(&mut control).await, "JOIN #chan\r\n");
    }

    #[tokio::test]
    async fn say_is_throttled() {
        let (mut session, mut control) = session_with_channel();

        session.say("#chan", "one").unwrap();
        session.say("#chan", "two").unwrap();
        assert!(matches!(
            session.say("#chan", "three"),
            Err(ConnectionError::Throttled)
        ));

        assert_eq!(next_sent(&mut control).await, "PRIVMSG #chan :one\r\n");
        assert_eq!(next_sent(&mut control).await, "PRIVMSG #chan :two\r\n");
        assert!(control.try_recv().is_err());
    }
}
