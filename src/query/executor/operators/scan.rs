// Sequential Scan Operator
//
// Walks one heap file page by page through the buffer pool.

use std::collections::VecDeque;
use std::sync::Arc;

use crate::common::types::{PageId, Permission, TransactionId};
use crate::query::executor::operators::Operator;
use crate::query::executor::result::{QueryError, QueryResult};
use crate::storage::buffer::BufferPool;
use crate::storage::disk::HeapFile;
use crate::storage::tuple::Tuple;

/// Sequential scan over one heap file: pages in strictly increasing
/// order, tuples in slot order within a page. Every page is fetched
/// through the buffer pool under a shared lock, which the transaction
/// keeps until it commits or aborts — closing the scan releases nothing.
pub struct SeqScan {
    file: Arc<HeapFile>,
    pool: Arc<BufferPool>,
    tid: TransactionId,
    page_no: u32,
    /// Tuples remaining on the current page; `None` while closed
    tuples: Option<VecDeque<Tuple>>,
}

impl SeqScan {
    pub fn new(file: Arc<HeapFile>, pool: Arc<BufferPool>, tid: TransactionId) -> Self {
        Self {
            file,
            pool,
            tid,
            page_no: 0,
            tuples: None,
        }
    }

    fn page_tuples(&self, page_no: u32) -> QueryResult<VecDeque<Tuple>> {
        let pid = PageId::new(self.file.table_id(), page_no);
        let page = self.pool.get_page(self.tid, pid, Permission::Shared)?;
        let guard = page.read();
        Ok(guard.tuples()?.into())
    }
}

impl Operator for SeqScan {
    fn open(&mut self) -> QueryResult<()> {
        self.page_no = 0;
        self.tuples = Some(if self.file.num_pages()? == 0 {
            VecDeque::new()
        } else {
            self.page_tuples(0)?
        });
        Ok(())
    }

    fn next(&mut self) -> QueryResult<Option<Tuple>> {
        if self.tuples.is_none() {
            return Err(QueryError::IteratorNotOpen);
        }
        if let Some(tuple) = self.tuples.as_mut().and_then(|queue| queue.pop_front()) {
            return Ok(Some(tuple));
        }

        // Advance past pages with no live tuples until one yields or the
        // file runs out.
        loop {
            if self.page_no + 1 >= self.file.num_pages()? {
                return Ok(None);
            }
            self.page_no += 1;
            let mut tuples = self.page_tuples(self.page_no)?;
            if let Some(tuple) = tuples.pop_front() {
                self.tuples = Some(tuples);
                return Ok(Some(tuple));
            }
        }
    }

    fn rewind(&mut self) -> QueryResult<()> {
        self.close()?;
        self.open()
    }

    fn close(&mut self) -> QueryResult<()> {
        self.tuples = None;
        self.page_no = 0;
        Ok(())
    }
}
