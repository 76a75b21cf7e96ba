//! Response body wrapper that reports when the body is finished with.

use std::{
    pin::Pin,
    task::{Context, Poll},
};

use http_body::{Body, Frame, SizeHint};
use tokio::sync::oneshot;

/// Wraps a body and fires `done` once the inner body has been read to the end
/// or the server drops it, whichever happens first.
pub struct CompletionBody<B> {
    inner: B,
    done: Option<oneshot::Sender<()>>,
}

impl<B> CompletionBody<B> {
    pub fn new(inner: B, done: oneshot::Sender<()>) -> Self {
        Self {
            inner,
            done: Some(done),
        }
    }

    fn finish(&mut self) {
        if let Some(done) = self.done.take() {
            // The receiver may be gone already; nothing to do then.
            let _ = done.send(());
        }
    }
}

impl<B> Body for CompletionBody<B>
where
    B: Body + Unpin,
{
    type Data = B::Data;
    type Error = B::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.get_mut();
        let polled = Pin::new(&mut this.inner).poll_frame(cx);
        if let Poll::Ready(None) = polled {
            this.finish();
        }
        polled
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}

impl<B> Drop for CompletionBody<B> {
    fn drop(&mut self) {
        self.finish();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Bytes;
    use http_body_util::{BodyExt, Full};

    #[tokio::test]
    async fn fires_after_the_body_is_read() {
        let (tx, mut rx) = oneshot::channel();
        let mut body = CompletionBody::new(Full::new(Bytes::from_static(b"hello")), tx);

        let frame = body.frame().await.unwrap().unwrap();
        assert_eq!(frame.into_data().unwrap(), Bytes::from_static(b"hello"));
        assert!(rx.try_recv().is_err());

        assert!(body.frame().await.is_none());
        assert!(rx.try_recv().is_ok());
    }

    #[tokio::test]
    async fn fires_when_dropped_unread() {
        let (tx, rx) = oneshot::channel();
        let body = CompletionBody::new(Full::new(Bytes::from_static(b"hello")), tx);

        drop(body);

        assert!(rx.await.is_ok());
    }

    #[tokio::test]
    async fn collected_body_is_unchanged() {
        let (tx, rx) = oneshot::channel();
        let body = CompletionBody::new(Full::new(Bytes::from_static(b"hello")), tx);

        let bytes = body.collect().await.unwrap().to_bytes();

        assert_eq!(bytes, Bytes::from_static(b"hello"));
        assert!(rx.await.is_ok());
    }
}
