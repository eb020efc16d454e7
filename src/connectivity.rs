//! Connectivity pattern interface
//!
//! Connectivity generation (one-to-one, full, Gaussian, pool-tile, ...) is
//! an external collaborator (`spec.md` §1): this module only defines the
//! seam a generator plugs into, plus the two trivial patterns
//! ([`OneToOne`], [`Full`]) this crate's own tests and scenarios need.
//! A real generator returns the same three arrays [`Path::build`] expects.

/// A generated connectivity: which sender connects to which receiver.
///
/// `send_counts[si]` / `recv_counts[ri]` are the per-unit fan-out/fan-in;
/// `conn_bits` is a flattened `(sender, receiver)` pair list in sender-major
/// order, matching the order `Path::build` expects to fill `Syns[]`.
pub struct GeneratedConnectivity {
    /// Number of outgoing connections per sender unit
    pub send_counts: Vec<usize>,
    /// Number of incoming connections per receiver unit
    pub recv_counts: Vec<usize>,
    /// Flattened `(sender_index, receiver_index)` pairs, sender-major order
    pub conn_bits: Vec<(usize, usize)>,
}

/// External connectivity-pattern collaborator interface
pub trait ConnectivityPattern {
    /// Generate connections between a sender layer of `n_send` units and a
    /// receiver layer of `n_recv` units
    fn connect(&self, n_send: usize, n_recv: usize) -> GeneratedConnectivity;
}

/// One-to-one: `send[i] -> recv[i]`, requires `n_send == n_recv`
#[derive(Debug, Clone, Copy, Default)]
pub struct OneToOne;

impl ConnectivityPattern for OneToOne {
    fn connect(&self, n_send: usize, n_recv: usize) -> GeneratedConnectivity {
        assert_eq!(n_send, n_recv, "OneToOne requires equal sender/receiver counts");
        let conn_bits: Vec<(usize, usize)> = (0..n_send).map(|i| (i, i)).collect();
        GeneratedConnectivity {
            send_counts: vec![1; n_send],
            recv_counts: vec![1; n_recv],
            conn_bits,
        }
    }
}

/// Fully connected: every sender connects to every receiver
#[derive(Debug, Clone, Copy, Default)]
pub struct Full;

impl ConnectivityPattern for Full {
    fn connect(&self, n_send: usize, n_recv: usize) -> GeneratedConnectivity {
        let mut conn_bits = Vec::with_capacity(n_send * n_recv);
        for si in 0..n_send {
            for ri in 0..n_recv {
                conn_bits.push((si, ri));
            }
        }
        GeneratedConnectivity {
            send_counts: vec![n_recv; n_send],
            recv_counts: vec![n_send; n_recv],
            conn_bits,
        }
    }
}
