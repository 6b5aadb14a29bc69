/// 固定容量循环缓冲区
///
/// 写满后覆盖最旧的元素，用于控制台输出、资源日志等只需保留最近记录的场景。
#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    buffer: Vec<Option<T>>,
    capacity: usize,
    head: usize,
    tail: usize,
    size: usize,
    // 因覆盖而丢弃的元素数量
    overwritten: u64,
}

impl<T> RingBuffer<T> {
    pub fn new(capacity: usize) -> Self {
        // 容量至少为1，避免取模为0
        let capacity = capacity.max(1);
        Self {
            buffer: (0..capacity).map(|_| None).collect(),
            capacity,
            head: 0,
            tail: 0,
            size: 0,
            overwritten: 0,
        }
    }

    /// 推入元素，缓冲区满时覆盖最旧的数据
    pub fn push(&mut self, item: T) {
        if self.size == self.capacity {
            self.head = (self.head + 1) % self.capacity;
            self.overwritten += 1;
        } else {
            self.size += 1;
        }

        self.buffer[self.tail] = Some(item);
        self.tail = (self.tail + 1) % self.capacity;
    }

    pub fn pop(&mut self) -> Option<T> {
        if self.size == 0 {
            return None;
        }

        let item = self.buffer[self.head].take();
        self.head = (self.head + 1) % self.capacity;
        self.size -= 1;
        item
    }

    /// 最新推入的元素
    pub fn back(&self) -> Option<&T> {
        if self.size == 0 {
            return None;
        }
        let idx = (self.tail + self.capacity - 1) % self.capacity;
        self.buffer[idx].as_ref()
    }

    /// 按从旧到新的顺序遍历
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        (0..self.size).filter_map(move |offset| self.buffer[(self.head + offset) % self.capacity].as_ref())
    }

    pub fn len(&self) -> usize {
        self.size
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    pub fn is_full(&self) -> bool {
        self.size == self.capacity
    }

    pub fn overwritten(&self) -> u64 {
        self.overwritten
    }

    // 清空缓冲区但不释放内存
    pub fn clear(&mut self) {
        while self.pop().is_some() {}
        self.head = 0;
        self.tail = 0;
    }
}
